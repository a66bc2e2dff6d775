pub mod check;
pub mod doctor;
pub mod onboard;
pub mod scan;
