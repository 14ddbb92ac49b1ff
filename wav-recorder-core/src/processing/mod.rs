pub mod amplitude_meter;
pub mod wav_format;
