//! Plain data records of the quality management system, as stored and
//! exchanged. These types carry no behaviour beyond small accessors.

pub mod activity;
pub mod batch;
pub mod command;
pub mod equipment;
pub mod file_formats;
pub mod ipqc;
pub mod market;
pub mod personnel;
pub mod product;
pub mod quality;
pub mod record;
pub mod stability;
pub mod testing;
