// imgmark - watermark preparation, placement and compositing core

pub mod config;
pub mod constants;
pub mod imaging;
pub mod imath;
pub mod logging;
pub mod pipeline;
pub mod watermark;
