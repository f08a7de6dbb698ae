pub mod session {

    /// Fixed session key holding the serialized admin identity.
    pub const IDENTITY_KEY: &str = "admin";
}

pub mod auth {

    /// Login entry point unauthenticated page requests are redirected to.
    pub const LOGIN_PATH: &str = "/login";

    /// Prefix of generated temporary secrets, followed by six random digits.
    pub const TEMP_SECRET_PREFIX: &str = "reset-";

    pub const TEMP_SECRET_DIGITS: u32 = 6;
}
