pub mod display;
pub mod spinner;

pub use spinner::ListingSpinner;
