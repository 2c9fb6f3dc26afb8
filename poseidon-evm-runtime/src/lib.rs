//! # Poseidon EVM Runtime
//!
//! Execute generated Poseidon contracts without a blockchain node.
//!
//! This runtime interprets the EVM subset emitted by the code generator and its
//! deployment loader, with 256-bit words, byte-addressed memory and static gas
//! accounting.
//!
//! ## Features
//!
//! - **Modular arithmetic**: ADDMOD/MULMOD over arbitrary moduli
//! - **Jump analysis**: only `JUMPDEST`s outside push data are valid targets
//! - **Memory**: word-granular growth with quadratic expansion cost
//! - **Deployment**: run creation code and obtain the runtime code it returns
//!
//! ## Example
//!
//! ```rust
//! use poseidon_evm_runtime::{VM, VMConfig, HaltReason};
//!
//! // PUSH1 0x2a, PUSH1 0, MSTORE, PUSH1 0x20, PUSH1 0, RETURN
//! let code = vec![0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3];
//! let result = VM::new(code, vec![], VMConfig::default()).run().unwrap();
//! assert_eq!(result.halt_reason, HaltReason::Return);
//! println!("Steps: {}", result.steps);
//! ```

pub mod error;
pub mod execute;
pub mod memory;
pub mod state;
pub mod vm;
pub mod word;

pub use error::{Result, RuntimeError};
pub use execute::{execute, ExecutionContext};
pub use memory::Memory;
pub use state::{HaltReason, VMState};
pub use vm::{ExecutionResult, VMConfig, VM};
pub use word::Word;

/// Call `code` with `calldata` using the default configuration
pub fn call(code: &[u8], calldata: &[u8]) -> Result<ExecutionResult> {
    VM::new(code.to_vec(), calldata.to_vec(), VMConfig::default()).run()
}

/// Run creation code and return the runtime code it deploys
pub fn deploy(creation_code: &[u8]) -> Result<Vec<u8>> {
    let result = call(creation_code, &[])?;
    match result.halt_reason {
        HaltReason::Return => Ok(result.return_data),
        other => Err(RuntimeError::DeploymentFailed(other)),
    }
}
