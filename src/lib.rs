pub mod qrng;
