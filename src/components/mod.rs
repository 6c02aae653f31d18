pub mod toast;
pub mod ui;
