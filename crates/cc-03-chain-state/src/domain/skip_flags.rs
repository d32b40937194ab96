use bitflags::bitflags;

bitflags! {
    /// Validation steps a trusted caller may skip. Flags combine with `|`;
    /// the default skips nothing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SkipFlags: u32 {
        const WITNESS_SIGNATURE      = 1 << 0;
        const TRANSACTION_SIGNATURES = 1 << 1;
        const TRANSACTION_DUPE_CHECK = 1 << 2;
        const FORK_DB                = 1 << 3;
        const BLOCK_SIZE_CHECK       = 1 << 4;
        const TAPOS_CHECK            = 1 << 5;
        const AUTHORITY_CHECK        = 1 << 6;
        const MERKLE_CHECK           = 1 << 7;
        const UNDO_HISTORY_CHECK     = 1 << 8;
        const WITNESS_SCHEDULE_CHECK = 1 << 9;
        const VALIDATE_OPERATIONS    = 1 << 10;
        const VALIDATE_INVARIANTS    = 1 << 11;
        const UNDO_BLOCK             = 1 << 12;
        const BLOCK_LOG              = 1 << 13;
        const APPLY_TRANSACTION      = 1 << 14;
        const DATABASE_LOCKING       = 1 << 15;
    }
}

impl SkipFlags {
    pub const NOTHING: SkipFlags = SkipFlags::empty();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_additive() {
        let skip = SkipFlags::TAPOS_CHECK | SkipFlags::AUTHORITY_CHECK;
        assert!(skip.contains(SkipFlags::TAPOS_CHECK));
        assert!(skip.contains(SkipFlags::AUTHORITY_CHECK));
        assert!(!skip.contains(SkipFlags::MERKLE_CHECK));
        assert_eq!(SkipFlags::default(), SkipFlags::NOTHING);
    }
}
