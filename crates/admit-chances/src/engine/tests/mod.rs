mod assembly;
mod common;
mod degradation;
