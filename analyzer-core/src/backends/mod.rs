#[cfg(feature = "backend_mock")]
pub mod mock;

#[cfg(feature = "backend_nmcli")]
pub mod nmcli;
