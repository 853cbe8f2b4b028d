//! Source providers

pub mod dramabox;
pub mod melolo;
pub mod netshort;

pub use dramabox::DramaBoxProvider;
pub use melolo::MeloloProvider;
pub use netshort::NetShortProvider;
