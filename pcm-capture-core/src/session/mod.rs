pub mod device_recorder;
pub mod pump;
pub mod recording;

#[cfg(test)]
pub(crate) mod testing;
