//! # Permutation Code Generator
//!
//! Drives the assembler through the whole program:
//!
//! 1. prologue: selector check, abort on mismatch
//! 2. matrix constants into scratch memory
//! 3. modulus, inputs and capacity element onto the stack
//! 4. round schedule
//! 5. epilogue: return the digest
//! 6. the shared dense-mix subroutine
//!
//! Round schedule over the optimized tables (R_f = R_F / 2):
//!
//! ```text
//! ark(a_0)
//! R_f - 1 times:   sigma all, ark(a_r),  call mix(M)
//! transitional:    sigma all, ark(a_Rf), inline mix(P)
//! R_P times:       sigma st_0, st_0 += b_r, sparse update S_r
//! R_f - 1 times:   sigma all, ark(d_r),  call mix(M)
//! final:           sigma all,            call mix(M)
//! ```

use crate::abi::{self, ArgEncoding, InterfaceDescriptor};
use crate::constants::OptimizedConstants;
use crate::error::Result;
use crate::export::AssembledProgram;
use crate::layout::{MatrixSlot, ScratchLayout, RETURN_ADDRESS_CELL};
use crate::motif::{self, StackOp};
use crate::params::{GeneratorConfig, MixStrategy, PoseidonParams};
use crate::stack::StackLayout;
use crate::subroutine::{self, MIX_LABEL};
use num_bigint::BigUint;
use num_traits::One;
use poseidon_evm_assembler::Assembler;
use poseidon_evm_spec::{Fr, MAX_PUSH_WIDTH, WORD_SIZE};
use tracing::{debug, info, warn};

/// Label of the first instruction after the selector check
pub const START_LABEL: &str = "start";

/// Calldata offset of the first argument word
const ARGS_OFFSET: u64 = 4;

/// Shift that moves the selector from the top of the first calldata word to its bottom
const SELECTOR_SHIFT: usize = 224;

/// Generate the program for `n_inputs` inputs with the default configuration
pub fn generate(n_inputs: usize) -> Result<AssembledProgram> {
    generate_with(n_inputs, &GeneratorConfig::default())
}

/// Generate the program for `n_inputs` inputs
pub fn generate_with(n_inputs: usize, config: &GeneratorConfig) -> Result<AssembledProgram> {
    let params = PoseidonParams::for_inputs(n_inputs)?;
    let constants = OptimizedConstants::generate(&params)?;
    generate_from_tables(&params, &constants, config)
}

/// Generate the program over externally supplied tables
pub fn generate_from_tables(
    params: &PoseidonParams,
    constants: &OptimizedConstants,
    config: &GeneratorConfig,
) -> Result<AssembledProgram> {
    constants.validate(params)?;
    let strategy = config.mix_strategy.resolve(params.width)?;

    let mut generator = Generator::new(params, constants, strategy);
    generator.prologue(&config.function_name)?;
    generator.store_matrices();
    generator.load_state()?;
    generator.first_full_rounds()?;
    generator.transitional_round()?;
    generator.partial_rounds()?;
    generator.last_full_rounds()?;
    generator.epilogue();
    generator.mix_subroutine()?;

    let runtime = generator.asm.resolve()?;
    let program = AssembledProgram {
        params: *params,
        function_name: config.function_name.clone(),
        strategy,
        interface: InterfaceDescriptor::poseidon(&config.function_name, params.n_inputs()),
        runtime,
    };

    info!(
        width = params.width,
        strategy = ?strategy,
        size = program.code_size(),
        labels = program.runtime.labels.len(),
        "generated poseidon program"
    );
    if program.exceeds_code_size_limit() {
        warn!("{}", program.size_report());
    }

    Ok(program)
}

struct Generator<'a> {
    params: &'a PoseidonParams,
    constants: &'a OptimizedConstants,
    strategy: MixStrategy,
    stack: StackLayout,
    scratch: ScratchLayout,
    asm: Assembler,
}

impl<'a> Generator<'a> {
    fn new(params: &'a PoseidonParams, constants: &'a OptimizedConstants, strategy: MixStrategy) -> Self {
        Self {
            params,
            constants,
            strategy,
            stack: StackLayout::new(params.width),
            scratch: ScratchLayout::new(params.width),
            asm: Assembler::new(),
        }
    }

    fn emit(&mut self, ops: Vec<StackOp>) -> Result<()> {
        motif::emit(&mut self.asm, &ops)
    }

    fn push_selector(&mut self, name: &str, encoding: ArgEncoding) -> Result<()> {
        let selector = abi::selector(&abi::signature(name, encoding, self.params.n_inputs()));
        self.asm.push(&BigUint::from_bytes_be(&selector))?;
        Ok(())
    }

    /// `selector == uint256 form || selector == bytes32 form`, else INVALID
    fn prologue(&mut self, name: &str) -> Result<()> {
        debug!(offset = self.asm.len(), "prologue");
        self.asm.push(&(BigUint::one() << SELECTOR_SHIFT))?;
        self.asm.push_u64(0);
        self.asm.call_data_load();
        self.asm.div();
        self.asm.dup(0)?;
        self.push_selector(name, ArgEncoding::Uint256)?;
        self.asm.eq();
        self.asm.swap(1)?;
        self.push_selector(name, ArgEncoding::Bytes32)?;
        self.asm.eq();
        self.asm.or();
        self.asm.jump_if(START_LABEL);
        self.asm.invalid();
        self.asm.label(START_LABEL)?;
        Ok(())
    }

    fn store_matrices(&mut self) {
        debug!(offset = self.asm.len(), "matrix constants");
        let t = self.params.width;
        for i in 0..t {
            for j in 0..t {
                self.asm.push_word(&self.constants.mds[(i, j)]);
                self.asm
                    .push_u64(self.scratch.matrix_cell(MatrixSlot::Mds, i, j) as u64);
                self.asm.mstore();
                self.asm.push_word(&self.constants.transition[(i, j)]);
                self.asm
                    .push_u64(self.scratch.matrix_cell(MatrixSlot::Transition, i, j) as u64);
                self.asm.mstore();
            }
        }
    }

    /// Modulus, then inputs last to first, then the zero capacity element on top
    fn load_state(&mut self) -> Result<()> {
        debug!(offset = self.asm.len(), "load state");
        self.asm.push_fixed(Fr::modulus(), MAX_PUSH_WIDTH)?;
        let n = self.params.n_inputs() as u64;
        for i in (0..n).rev() {
            self.asm.push_u64(ARGS_OFFSET + WORD_SIZE as u64 * i);
            self.asm.call_data_load();
        }
        self.asm.push_u64(0);
        Ok(())
    }

    fn call_mix(&mut self) -> Result<()> {
        subroutine::emit_call(&mut self.asm, MIX_LABEL)?;
        Ok(())
    }

    fn first_full_rounds(&mut self) -> Result<()> {
        debug!(offset = self.asm.len(), "first full rounds");
        let (params, constants, stack) = (self.params, self.constants, self.stack);
        self.emit(motif::ark(&stack, constants.first_half(params, 0)))?;
        for round in 1..params.half_full_rounds() {
            self.emit(motif::sigma_all(&stack))?;
            self.emit(motif::ark(&stack, constants.first_half(params, round)))?;
            self.call_mix()?;
        }
        Ok(())
    }

    /// Last full round before the partial phase, mixing with the transition matrix inline
    fn transitional_round(&mut self) -> Result<()> {
        debug!(offset = self.asm.len(), "transitional round");
        let (params, constants, stack) = (self.params, self.constants, self.stack);
        self.emit(motif::sigma_all(&stack))?;
        self.emit(motif::ark(
            &stack,
            constants.first_half(params, params.half_full_rounds()),
        ))?;
        self.emit(motif::dense_mix(
            self.strategy,
            &stack,
            &self.scratch,
            MatrixSlot::Transition,
        ))
    }

    fn partial_rounds(&mut self) -> Result<()> {
        debug!(
            offset = self.asm.len(),
            rounds = self.params.partial_rounds,
            "partial rounds"
        );
        let (params, constants, stack) = (self.params, self.constants, self.stack);
        for (round, sparse) in constants.sparse.iter().enumerate() {
            self.emit(motif::partial_round(
                &stack,
                constants.partial(params, round),
                sparse,
            ))?;
        }
        Ok(())
    }

    fn last_full_rounds(&mut self) -> Result<()> {
        debug!(offset = self.asm.len(), "last full rounds");
        let (params, constants, stack) = (self.params, self.constants, self.stack);
        for round in 0..params.half_full_rounds() - 1 {
            self.emit(motif::sigma_all(&stack))?;
            self.emit(motif::ark(&stack, constants.second_half(params, round)))?;
            self.call_mix()?;
        }
        self.emit(motif::sigma_all(&stack))?;
        self.call_mix()
    }

    /// Digest into cell 0 (the return address is dead by now), return 32 bytes
    fn epilogue(&mut self) {
        debug!(offset = self.asm.len(), "epilogue");
        self.asm.push_u64(RETURN_ADDRESS_CELL as u64);
        self.asm.mstore();
        self.asm.push_u64(WORD_SIZE as u64);
        self.asm.push_u64(RETURN_ADDRESS_CELL as u64);
        self.asm.ret();
    }

    fn mix_subroutine(&mut self) -> Result<()> {
        debug!(offset = self.asm.len(), strategy = ?self.strategy, "mix subroutine");
        let body = motif::dense_mix(self.strategy, &self.stack, &self.scratch, MatrixSlot::Mds);
        subroutine::emit_subroutine(&mut self.asm, MIX_LABEL, &body)
    }
}
