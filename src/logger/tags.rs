/// Log tags identifying the relay subsystem a message came from

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTag {
    System,
    Config,
    Auth,
    Relay,
    Producer,
    Subscriber,
    Decoder,
    Fleet,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used for --debug-<key> flag matching
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Auth => "auth".to_string(),
            LogTag::Relay => "relay".to_string(),
            LogTag::Producer => "producer".to_string(),
            LogTag::Subscriber => "subscriber".to_string(),
            LogTag::Decoder => "decoder".to_string(),
            LogTag::Fleet => "fleet".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(s) => s.to_lowercase(),
        }
    }

    /// Uncolored tag text for plain output
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Auth => "AUTH".to_string(),
            LogTag::Relay => "RELAY".to_string(),
            LogTag::Producer => "PRODUCER".to_string(),
            LogTag::Subscriber => "SUBSCRIBE".to_string(),
            LogTag::Decoder => "DECODER".to_string(),
            LogTag::Fleet => "FLEET".to_string(),
            LogTag::Test => "TEST".to_string(),
            LogTag::Other(s) => s.to_uppercase(),
        }
    }
}
