pub mod address;
pub mod export_view_key;
pub mod scan;
pub mod send;
pub mod withdraw;
