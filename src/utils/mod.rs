pub mod clock;
pub mod jwt;
pub mod otp_code;
pub mod password;
