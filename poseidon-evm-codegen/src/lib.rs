//! # Poseidon EVM Code Generator
//!
//! Compiles the Poseidon permutation over the BN254 scalar field (x^5 S-box,
//! 8 full rounds, width 2..=9) into a standalone EVM contract that returns the
//! hash of its inputs.
//!
//! The generated code uses the optimized round schedule: round constants are
//! moved through the linear layers, and partial rounds use one sparse matrix
//! each, so a partial round costs 2t - 1 multiplications instead of t^2.
//!
//! ## Layers
//!
//! - [`params`]: widths, round counts and generator configuration
//! - [`constants`]: Grain LFSR tables and their optimized form
//! - [`stack`]: dup/swap depths of every logical value
//! - [`motif`]: ark, S-box, dense and sparse mixing as stack-op sequences
//! - [`subroutine`]: call/return through a memory cell
//! - [`generator`]: the full program
//! - [`export`]: creation code, selectors, calldata, interface descriptor
//! - [`reference`]: direct evaluation used as the test oracle
//!
//! ## Example
//!
//! ```rust
//! use poseidon_evm_codegen::{generate, ArgEncoding};
//! use poseidon_evm_spec::Fr;
//!
//! let program = generate(2).unwrap();
//! assert!(!program.exceeds_code_size_limit());
//!
//! let calldata = program
//!     .calldata(ArgEncoding::Uint256, &[Fr::from_u64(1), Fr::from_u64(2)])
//!     .unwrap();
//! assert_eq!(calldata.len(), 4 + 2 * 32);
//! println!("{}", program.interface.to_json().unwrap());
//! ```

pub mod abi;
pub mod constants;
pub mod error;
pub mod export;
pub mod generator;
pub mod layout;
pub mod matrix;
pub mod motif;
pub mod params;
pub mod reference;
pub mod sparse;
pub mod stack;
pub mod subroutine;

pub use abi::{ArgEncoding, InterfaceDescriptor};
pub use constants::{OptimizedConstants, ReferenceConstants};
pub use error::{CodegenError, Result};
pub use export::{AssembledProgram, SizeReport};
pub use generator::{generate, generate_from_tables, generate_with};
pub use matrix::Matrix;
pub use params::{GeneratorConfig, MixStrategy, PoseidonParams};
pub use sparse::SparseMatrix;
