//! The [ProcessTraceOracle] runs an external fault proof VM, such as `cannon`, to produce step witnesses.

use alloy_primitives::hex;
use anyhow::{bail, Result};
use balin_fault::{LocalInputs, StepWitness, TraceOracle};
use std::{path::PathBuf, process::Stdio};
use tokio::process::Command;

/// The [ProcessTraceOracle] is a [TraceOracle] that shells out to a VM executable. The executable is invoked as
///
/// - `<bin> <args..> prestate`
/// - `<bin> <args..> step --step <n> --agreed-block <n> --agreed-output <hex> --disputed-block <n> --disputed-output <hex>`
///
/// and prints a JSON [StepWitness] on stdout. The process is killed if the future awaiting it is dropped.
#[derive(Debug, Clone)]
pub struct ProcessTraceOracle {
    pub bin: PathBuf,
    pub args: Vec<String>,
}

impl ProcessTraceOracle {
    pub fn new(bin: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            bin: bin.into(),
            args,
        }
    }

    async fn run(&self, command_args: &[String]) -> Result<StepWitness> {
        let output = Command::new(&self.bin)
            .args(&self.args)
            .args(command_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.bin.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait::async_trait]
impl TraceOracle for ProcessTraceOracle {
    async fn prestate(&self) -> Result<StepWitness> {
        self.run(&["prestate".to_string()]).await
    }

    async fn step_at(&self, inputs: &LocalInputs, step: u64) -> Result<StepWitness> {
        let witness = self
            .run(&[
                "step".to_string(),
                "--step".to_string(),
                step.to_string(),
                "--agreed-block".to_string(),
                inputs.agreed_block_number.to_string(),
                "--agreed-output".to_string(),
                hex::encode_prefixed(inputs.agreed_output_root),
                "--disputed-block".to_string(),
                inputs.disputed_block_number.to_string(),
                "--disputed-output".to_string(),
                hex::encode_prefixed(inputs.disputed_output_root),
            ])
            .await?;

        if witness.step > step || (witness.step < step && !witness.exited) {
            bail!(
                "Oracle answered step {} with a witness for step {}",
                step,
                witness.step
            );
        }
        Ok(witness)
    }
}
