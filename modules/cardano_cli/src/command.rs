use leaderlog_common::NetworkMagic;
use std::fmt::{self, Display, Formatter};

/// Node queries issued by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    LedgerState,
    ProtocolParameters,
    Tip,
}

impl Query {
    fn subcommand(&self) -> &'static str {
        match self {
            Query::LedgerState => "ledger-state",
            Query::ProtocolParameters => "protocol-parameters",
            Query::Tip => "tip",
        }
    }

    /// Full argument list, optionally under an era sub-command
    pub fn args(&self, era: Option<&str>, network: &NetworkMagic) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(era) = era {
            args.push(era.to_string());
        }
        args.push("query".to_string());
        args.push(self.subcommand().to_string());
        match self {
            Query::LedgerState | Query::ProtocolParameters => {
                args.push("--cardano-mode".to_string())
            }
            Query::Tip => {}
        }
        args.extend(network.cli_args());
        args
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "query {}", self.subcommand())
    }
}
