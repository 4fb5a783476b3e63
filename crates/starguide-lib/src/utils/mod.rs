// Utility helpers

pub mod time_format;
