//! External eligibility oracle

use crate::parameters::EligibilityParameters;
use async_trait::async_trait;
use std::io;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Cannot run eligibility oracle {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("Eligibility oracle exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

/// One-shot leader eligibility computation over assembled parameters
#[async_trait]
pub trait EligibilityOracle: Send + Sync {
    /// Run the computation and return its output bytes unmodified, whatever
    /// their encoding
    async fn evaluate(&self, parameters: &EligibilityParameters) -> Result<Vec<u8>, OracleError>;
}

/// Oracle run as an external program, parameters appended as named arguments
#[derive(Debug, Clone)]
pub struct ProcessOracle {
    program: String,
    leading_args: Vec<String>,
}

impl ProcessOracle {
    pub fn new(program: &str, leading_args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            leading_args: leading_args.to_vec(),
        }
    }
}

#[async_trait]
impl EligibilityOracle for ProcessOracle {
    async fn evaluate(&self, parameters: &EligibilityParameters) -> Result<Vec<u8>, OracleError> {
        info!("Running eligibility oracle {}", self.program);
        debug!("Oracle parameters: {parameters:?}");

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(parameters.to_args())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| OracleError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(OracleError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use leaderlog_common::EpochNonce;
    use std::path::Path;
    use std::str::FromStr;

    fn parameters() -> EligibilityParameters {
        EligibilityParameters::builder()
            .first_slot_of_epoch(864_000)
            .epoch_nonce(EpochNonce::new("cafe").unwrap())
            .pool_vrf_skey("aabb")
            .sigma(BigDecimal::from_str("0.25").unwrap())
            .decentralisation(BigDecimal::from_str("0.52").unwrap())
            .epoch_length(432_000)
            .active_slots_coeff(BigDecimal::from_str("0.05").unwrap())
            .libsodium_binary(Path::new("/usr/lib/libsodium.so"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_output_returned_verbatim() {
        // `sh -c script name args...` echoes the arguments back
        let oracle = ProcessOracle::new(
            "sh",
            &[
                "-c".to_string(),
                r#"printf 'slots:\n'; printf '%s|' "$@""#.to_string(),
                "oracle".to_string(),
            ],
        );

        let output = oracle.evaluate(&parameters()).await.unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "slots:\n--first-slot-of-epoch|864000|--epoch-nonce|cafe|--vrf-skey|aabb|--sigma|0.25|\
             --d|0.52|--epoch-length|432000|--active-slots-coeff|0.05|\
             --libsodium-binary|/usr/lib/libsodium.so|"
        );
    }

    #[tokio::test]
    async fn test_non_utf8_output_passed_through() {
        let oracle = ProcessOracle::new(
            "sh",
            &["-c".to_string(), r"printf 'slot \377\n'".to_string()],
        );

        let output = oracle.evaluate(&parameters()).await.unwrap();
        assert_eq!(output, b"slot \xff\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_error() {
        let oracle = ProcessOracle::new(
            "sh",
            &["-c".to_string(), "echo 'bad nonce' >&2; exit 3".to_string()],
        );

        match oracle.evaluate(&parameters()).await {
            Err(OracleError::Failed { status, stderr }) => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "bad nonce");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let oracle = ProcessOracle::new("/nonexistent/isSlotLeader", &[]);
        assert!(matches!(
            oracle.evaluate(&parameters()).await,
            Err(OracleError::Spawn { .. })
        ));
    }
}
