pub mod fake_platform;
pub mod mock_relay;
pub mod mock_youtube;
