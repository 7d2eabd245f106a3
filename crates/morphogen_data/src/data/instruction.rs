use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Behaviour shared by every instruction set a program tree can hold.
///
/// Trees, the genetic operators and the genome file format only ever talk to
/// instructions through this trait, so a new encoding is a new enum plus an
/// impl of this trait.
pub trait Instruction: Copy + Debug + PartialEq + Eq {
    /// Number of children a node holding this instruction must have.
    fn arity(&self) -> usize;

    /// Length of the integer argument vector carried by the node.
    fn arg_count(&self) -> usize;

    /// Protected instructions are never deleted or replaced wholesale by mutation.
    fn is_protected(&self) -> bool;

    /// The instruction that finalizes a cell. Mutation may only swap it for
    /// another terminal.
    fn is_terminator(&self) -> bool;

    /// Stable integer code used by the genome file format.
    fn code(&self) -> i32;

    fn from_code(code: i32) -> Option<Self>;

    /// Terminal instruction used to fill child slots opened by an arity change.
    fn placeholder() -> Self;

    /// Uniform draw over the whole instruction set.
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Uniform draw over instructions with at least `min_arity` children.
    fn random_with_min_arity<R: Rng + ?Sized>(rng: &mut R, min_arity: usize) -> Option<Self>;

    /// Uniform draw over the zero-arity instructions.
    fn random_terminal<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Uniform draw over the zero-arity instructions other than `self`.
    /// Returns `self` when it is the only terminal.
    fn random_other_terminal<R: Rng + ?Sized>(&self, rng: &mut R) -> Self;

    /// Fresh value for argument `index`, drawn from `[-spread, spread]` or a
    /// narrower instruction-specific range.
    fn random_arg<R: Rng + ?Sized>(&self, index: usize, spread: i32, rng: &mut R) -> i32;

    fn random_args<R: Rng + ?Sized>(&self, spread: i32, rng: &mut R) -> Vec<i32> {
        (0..self.arg_count())
            .map(|i| self.random_arg(i, spread, rng))
            .collect()
    }
}

/// Scalar register edits; each advances to the single child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterEdit {
    IncLink,
    DecLink,
    IncBias,
    DecBias,
    IncSigmoid,
    DecSigmoid,
    ToggleSign,
    IncThreshold,
    DecThreshold,
    IncAdaptation,
    DecAdaptation,
    IncDecay,
    DecDecay,
}

impl RegisterEdit {
    pub const ALL: [RegisterEdit; 13] = [
        RegisterEdit::IncLink,
        RegisterEdit::DecLink,
        RegisterEdit::IncBias,
        RegisterEdit::DecBias,
        RegisterEdit::IncSigmoid,
        RegisterEdit::DecSigmoid,
        RegisterEdit::ToggleSign,
        RegisterEdit::IncThreshold,
        RegisterEdit::DecThreshold,
        RegisterEdit::IncAdaptation,
        RegisterEdit::DecAdaptation,
        RegisterEdit::IncDecay,
        RegisterEdit::DecDecay,
    ];
}

/// Which parameter of the selected input synapse a coefficient edit touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoefTarget {
    A,
    B,
    C,
    D,
    LearningRate,
}

impl CoefTarget {
    pub const ALL: [CoefTarget; 5] = [
        CoefTarget::A,
        CoefTarget::B,
        CoefTarget::C,
        CoefTarget::D,
        CoefTarget::LearningRate,
    ];

    /// Index into the synapse coefficient array, `None` for the learning rate.
    #[must_use]
    pub fn coefficient_index(self) -> Option<usize> {
        match self {
            CoefTarget::A => Some(0),
            CoefTarget::B => Some(1),
            CoefTarget::C => Some(2),
            CoefTarget::D => Some(3),
            CoefTarget::LearningRate => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoefEdit {
    Flip,
    Increment,
    Decrement,
    Double,
    Halve,
}

impl CoefEdit {
    pub const ALL: [CoefEdit; 5] = [
        CoefEdit::Flip,
        CoefEdit::Increment,
        CoefEdit::Decrement,
        CoefEdit::Double,
        CoefEdit::Halve,
    ];

    /// Applies the edit to `value`; `step` is the increment/decrement size.
    #[must_use]
    pub fn apply(self, value: f32, step: f32) -> f32 {
        match self {
            CoefEdit::Flip => -value,
            CoefEdit::Increment => value + step,
            CoefEdit::Decrement => value - step,
            CoefEdit::Double => value * 2.0,
            CoefEdit::Halve => value * 0.5,
        }
    }
}

/// Cellular Encoding instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellOp {
    /// Finalize the cell into a neuron.
    End,
    /// Split into a serial pair; children diverge.
    SeqDivision,
    /// Split into a parallel pair; children diverge.
    ParDivision,
    /// Serial split where both cells continue at the same child.
    SeqClone,
    /// Parallel split where both cells continue at the same child.
    ParClone,
    /// Continue at the root of the tree `current + args[0]`.
    Jump,
    Wait,
    /// Remove the input synapse selected by the link register.
    Clip,
    Register(RegisterEdit),
    Coefficient { target: CoefTarget, edit: CoefEdit },
}

const BASE_OPS: [CellOp; 8] = [
    CellOp::End,
    CellOp::SeqDivision,
    CellOp::ParDivision,
    CellOp::SeqClone,
    CellOp::ParClone,
    CellOp::Jump,
    CellOp::Wait,
    CellOp::Clip,
];

const REGISTER_CODE_BASE: i32 = 8;
const COEFFICIENT_CODE_BASE: i32 = 32;

impl CellOp {
    /// Total number of distinct instructions.
    pub const COUNT: usize =
        BASE_OPS.len() + RegisterEdit::ALL.len() + CoefTarget::ALL.len() * CoefEdit::ALL.len();

    /// The `n`th instruction in a fixed enumeration order.
    #[must_use]
    pub fn nth(n: usize) -> Option<Self> {
        let registers = RegisterEdit::ALL.len();
        let edits = CoefEdit::ALL.len();
        if n < BASE_OPS.len() {
            return Some(BASE_OPS[n]);
        }
        let n = n - BASE_OPS.len();
        if n < registers {
            return Some(CellOp::Register(RegisterEdit::ALL[n]));
        }
        let n = n - registers;
        let target = *CoefTarget::ALL.get(n / edits)?;
        Some(CellOp::Coefficient {
            target,
            edit: CoefEdit::ALL[n % edits],
        })
    }

    pub fn all() -> impl Iterator<Item = CellOp> {
        (0..Self::COUNT).filter_map(Self::nth)
    }

    /// Division-family instructions spawn a second cell.
    #[must_use]
    pub fn is_division(&self) -> bool {
        matches!(
            self,
            CellOp::SeqDivision | CellOp::ParDivision | CellOp::SeqClone | CellOp::ParClone
        )
    }
}

impl Instruction for CellOp {
    fn arity(&self) -> usize {
        match self {
            CellOp::End | CellOp::Jump => 0,
            CellOp::SeqDivision | CellOp::ParDivision => 2,
            _ => 1,
        }
    }

    fn arg_count(&self) -> usize {
        match self {
            CellOp::Jump => 1,
            _ => 0,
        }
    }

    fn is_protected(&self) -> bool {
        matches!(self, CellOp::End | CellOp::Jump) || self.is_division()
    }

    fn is_terminator(&self) -> bool {
        matches!(self, CellOp::End)
    }

    fn code(&self) -> i32 {
        match self {
            CellOp::End => 0,
            CellOp::SeqDivision => 1,
            CellOp::ParDivision => 2,
            CellOp::SeqClone => 3,
            CellOp::ParClone => 4,
            CellOp::Jump => 5,
            CellOp::Wait => 6,
            CellOp::Clip => 7,
            CellOp::Register(edit) => {
                let idx = RegisterEdit::ALL
                    .iter()
                    .position(|e| e == edit)
                    .unwrap_or_default();
                REGISTER_CODE_BASE + idx as i32
            }
            CellOp::Coefficient { target, edit } => {
                let t = CoefTarget::ALL
                    .iter()
                    .position(|x| x == target)
                    .unwrap_or_default();
                let e = CoefEdit::ALL
                    .iter()
                    .position(|x| x == edit)
                    .unwrap_or_default();
                COEFFICIENT_CODE_BASE + (t * CoefEdit::ALL.len() + e) as i32
            }
        }
    }

    fn from_code(code: i32) -> Option<Self> {
        if (0..REGISTER_CODE_BASE).contains(&code) {
            return Some(BASE_OPS[code as usize]);
        }
        if code >= REGISTER_CODE_BASE && code < REGISTER_CODE_BASE + RegisterEdit::ALL.len() as i32 {
            return Some(CellOp::Register(
                RegisterEdit::ALL[(code - REGISTER_CODE_BASE) as usize],
            ));
        }
        let span = (CoefTarget::ALL.len() * CoefEdit::ALL.len()) as i32;
        if code >= COEFFICIENT_CODE_BASE && code < COEFFICIENT_CODE_BASE + span {
            let n = (code - COEFFICIENT_CODE_BASE) as usize;
            return Some(CellOp::Coefficient {
                target: CoefTarget::ALL[n / CoefEdit::ALL.len()],
                edit: CoefEdit::ALL[n % CoefEdit::ALL.len()],
            });
        }
        None
    }

    fn placeholder() -> Self {
        CellOp::End
    }

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::nth(rng.gen_range(0..Self::COUNT)).unwrap_or(CellOp::Wait)
    }

    fn random_with_min_arity<R: Rng + ?Sized>(rng: &mut R, min_arity: usize) -> Option<Self> {
        let candidates: Vec<CellOp> = Self::all().filter(|op| op.arity() >= min_arity).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    fn random_terminal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let terminals: Vec<CellOp> = Self::all().filter(|op| op.arity() == 0).collect();
        terminals[rng.gen_range(0..terminals.len())]
    }

    fn random_other_terminal<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let others: Vec<CellOp> = Self::all()
            .filter(|op| op.arity() == 0 && op != self)
            .collect();
        if others.is_empty() {
            return *self;
        }
        others[rng.gen_range(0..others.len())]
    }

    fn random_arg<R: Rng + ?Sized>(&self, _index: usize, spread: i32, rng: &mut R) -> i32 {
        let spread = spread.max(1);
        rng.gen_range(-spread..=spread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_codes_roundtrip_for_every_op() {
        for op in CellOp::all() {
            assert_eq!(CellOp::from_code(op.code()), Some(op), "{:?}", op);
        }
        assert_eq!(CellOp::all().count(), CellOp::COUNT);
    }

    #[test]
    fn test_unknown_codes_rejected() {
        assert_eq!(CellOp::from_code(-1), None);
        assert_eq!(CellOp::from_code(21), None);
        assert_eq!(CellOp::from_code(31), None);
        assert_eq!(CellOp::from_code(57), None);
    }

    #[test]
    fn test_arity_table() {
        assert_eq!(CellOp::End.arity(), 0);
        assert_eq!(CellOp::Jump.arity(), 0);
        assert_eq!(CellOp::SeqDivision.arity(), 2);
        assert_eq!(CellOp::ParDivision.arity(), 2);
        assert_eq!(CellOp::SeqClone.arity(), 1);
        assert_eq!(CellOp::Register(RegisterEdit::ToggleSign).arity(), 1);
        assert_eq!(CellOp::Jump.arg_count(), 1);
    }

    #[test]
    fn test_protected_set() {
        assert!(CellOp::End.is_protected());
        assert!(CellOp::Jump.is_protected());
        assert!(CellOp::ParClone.is_protected());
        assert!(!CellOp::Wait.is_protected());
        assert!(!CellOp::Clip.is_protected());
    }

    #[test]
    fn test_random_with_min_arity_respects_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let op = CellOp::random_with_min_arity(&mut rng, 2).expect("binary ops exist");
            assert_eq!(op.arity(), 2);
        }
        assert!(CellOp::random_with_min_arity(&mut rng, 3).is_none());
        for _ in 0..50 {
            assert_eq!(CellOp::random_terminal(&mut rng).arity(), 0);
        }
        for _ in 0..20 {
            assert_eq!(CellOp::End.random_other_terminal(&mut rng), CellOp::Jump);
            assert_eq!(CellOp::Jump.random_other_terminal(&mut rng), CellOp::End);
        }
        assert!(CellOp::End.is_terminator());
        assert!(!CellOp::Jump.is_terminator());
    }

    #[test]
    fn test_coef_edit_apply() {
        assert_eq!(CoefEdit::Flip.apply(0.5, 0.1), -0.5);
        assert_eq!(CoefEdit::Double.apply(0.5, 0.1), 1.0);
        assert_eq!(CoefEdit::Halve.apply(0.5, 0.1), 0.25);
        assert!((CoefEdit::Increment.apply(0.5, 0.1) - 0.6).abs() < 1e-6);
    }
}
