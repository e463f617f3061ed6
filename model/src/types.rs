//! Closed enumerations for the coverage data model.
//!
//! Each enum mirrors a UCIS type code. The numeric codes are part of the
//! model's external contract (storage backends persist them), so every enum
//! exposes `code()` and a checked `from_code()`; an unknown code is reported
//! to the caller rather than mapped to a catch-all variant.

/// Scope type identifiers for hierarchical coverage containers.
///
/// Codes are the UCIS scope-type bit values. Each scope has exactly one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeKind {
    Toggle,
    Branch,
    Expr,
    Cond,
    Instance,
    Process,
    Block,
    Function,
    ForkJoin,
    Generate,
    Generic,
    Class,
    Covergroup,
    CoverInstance,
    Coverpoint,
    Cross,
    Cover,
    Assert,
    Program,
    Package,
    Task,
    Interface,
    Fsm,
    DuModule,
    DuArch,
    DuPackage,
    DuProgram,
    DuInterface,
    FsmStates,
    FsmTrans,
    CovBlock,
    CvgBinScope,
    IllegalBinScope,
    IgnoreBinScope,
}

macro_rules! impl_codes {
    ($name:ident, $repr:ty, $(($variant:ident, $code:literal)),+ $(,)?) => {
        impl $name {
            /// Returns the UCIS numeric code for this variant.
            pub const fn code(&self) -> $repr {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Maps a UCIS numeric code back to a variant, if known.
            pub const fn from_code(code: $repr) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

impl_codes!(
    ScopeKind,
    u64,
    (Toggle, 0x1),
    (Branch, 0x2),
    (Expr, 0x4),
    (Cond, 0x8),
    (Instance, 0x10),
    (Process, 0x20),
    (Block, 0x40),
    (Function, 0x80),
    (ForkJoin, 0x100),
    (Generate, 0x200),
    (Generic, 0x400),
    (Class, 0x800),
    (Covergroup, 0x1000),
    (CoverInstance, 0x2000),
    (Coverpoint, 0x4000),
    (Cross, 0x8000),
    (Cover, 0x10000),
    (Assert, 0x20000),
    (Program, 0x40000),
    (Package, 0x80000),
    (Task, 0x100000),
    (Interface, 0x200000),
    (Fsm, 0x400000),
    (DuModule, 0x1000000),
    (DuArch, 0x2000000),
    (DuPackage, 0x4000000),
    (DuProgram, 0x8000000),
    (DuInterface, 0x10000000),
    (FsmStates, 0x20000000),
    (FsmTrans, 0x40000000),
    (CovBlock, 0x80000000),
    (CvgBinScope, 0x100000000),
    (IllegalBinScope, 0x200000000),
    (IgnoreBinScope, 0x400000000),
);

impl ScopeKind {
    /// Whether this scope is a design-unit definition (module, architecture,
    /// package, program, or interface definition, as opposed to an instance).
    pub const fn is_design_unit(&self) -> bool {
        matches!(
            self,
            Self::DuModule | Self::DuArch | Self::DuPackage | Self::DuProgram | Self::DuInterface
        )
    }
}

/// Coverage type identifiers for individual cover items (bins).
///
/// Codes are the UCIS cover-type bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CoverKind {
    CvgBin,
    CoverBin,
    AssertBin,
    StmtBin,
    BranchBin,
    ExprBin,
    CondBin,
    ToggleBin,
    PassBin,
    FsmBin,
    UserBin,
    Count,
    FailBin,
    VacuousBin,
    DisabledBin,
    AttemptBin,
    ActiveBin,
    IgnoreBin,
    IllegalBin,
    DefaultBin,
    PeakActiveBin,
    BlockBin,
}

impl_codes!(
    CoverKind,
    u64,
    (CvgBin, 0x1),
    (CoverBin, 0x2),
    (AssertBin, 0x4),
    (StmtBin, 0x20),
    (BranchBin, 0x40),
    (ExprBin, 0x80),
    (CondBin, 0x100),
    (ToggleBin, 0x200),
    (PassBin, 0x400),
    (FsmBin, 0x800),
    (UserBin, 0x1000),
    (Count, 0x2000),
    (FailBin, 0x4000),
    (VacuousBin, 0x8000),
    (DisabledBin, 0x10000),
    (AttemptBin, 0x20000),
    (ActiveBin, 0x40000),
    (IgnoreBin, 0x80000),
    (IllegalBin, 0x100000),
    (DefaultBin, 0x200000),
    (PeakActiveBin, 0x400000),
    (BlockBin, 0x1000000),
);

/// Formal verification result for an assertion cover item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormalStatus {
    /// No formal information recorded.
    #[default]
    None,
    /// The assertion fails.
    Failure,
    /// Proven to never fail.
    Proof,
    /// The assertion is vacuous.
    Vacuous,
    /// The proof failed to complete.
    Inconclusive,
    /// The assertion is an assumption.
    Assumption,
    /// Conflicting results were merged.
    Conflict,
}

impl_codes!(
    FormalStatus,
    u8,
    (None, 0),
    (Failure, 1),
    (Proof, 2),
    (Vacuous, 3),
    (Inconclusive, 4),
    (Assumption, 5),
    (Conflict, 6),
);

/// The kind of signal a toggle scope measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ToggleKind {
    /// A continuously-assigned signal (wire/net).
    #[default]
    Net,
    /// A registered signal.
    Reg,
}

impl_codes!(ToggleKind, u8, (Net, 1), (Reg, 2));

/// The port direction of a signal measured by a toggle scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ToggleDir {
    /// An internal (non-port) wire or variable.
    #[default]
    Internal,
    /// An input port.
    In,
    /// An output port.
    Out,
    /// A bidirectional port.
    InOut,
}

impl_codes!(ToggleDir, u8, (Internal, 1), (In, 2), (Out, 3), (InOut, 4));

/// String-property identifiers persisted by storage backends.
///
/// Only the subset a database round-trips through an archive is enumerated;
/// the full UCIS property surface is deliberately not mirrored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrProperty {
    UniqueId,
    Generic,
    Comment,
    ExprTerms,
    DesignVersionId,
    DuSignature,
}

impl_codes!(
    StrProperty,
    u32,
    (UniqueId, 4),
    (Generic, 10),
    (Comment, 12),
    (ExprTerms, 26),
    (DesignVersionId, 29),
    (DuSignature, 30),
);

/// An interned source file: a path and the working directory it is relative
/// to (empty when the path is absolute or the workdir is unknown).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: String,
    pub workdir: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            workdir: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_kind_codes_round_trip() {
        for kind in [
            ScopeKind::Toggle,
            ScopeKind::Branch,
            ScopeKind::Instance,
            ScopeKind::Covergroup,
            ScopeKind::DuModule,
            ScopeKind::FsmTrans,
            ScopeKind::IgnoreBinScope,
        ] {
            assert_eq!(ScopeKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ScopeKind::from_code(0), None);
        assert_eq!(ScopeKind::from_code(0x3), None);
    }

    #[test]
    fn test_cover_kind_codes_round_trip() {
        for kind in [
            CoverKind::CvgBin,
            CoverKind::ToggleBin,
            CoverKind::StmtBin,
            CoverKind::FsmBin,
            CoverKind::BlockBin,
        ] {
            assert_eq!(CoverKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(CoverKind::from_code(0x8), None);
    }

    #[test]
    fn test_design_unit_predicate() {
        assert!(ScopeKind::DuModule.is_design_unit());
        assert!(ScopeKind::DuInterface.is_design_unit());
        assert!(!ScopeKind::Instance.is_design_unit());
        assert!(!ScopeKind::Package.is_design_unit());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(FormalStatus::default(), FormalStatus::None);
        assert_eq!(ToggleKind::default(), ToggleKind::Net);
        assert_eq!(ToggleDir::default(), ToggleDir::Internal);
    }
}
