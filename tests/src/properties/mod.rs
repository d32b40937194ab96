//! # Property Tests
//!
//! Random edits applied inside a session and then rolled back must leave
//! the state exactly as it was, secondary indexes included.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cc_01_ledger_store::StoreConfig;
    use cc_03_chain_state::{Account, ChainState, GenesisConfig};
    use cc_04_evaluators::EvaluatorRegistry;
    use proptest::prelude::*;
    use shared_types::{AccountName, Asset};
    use std::collections::BTreeMap;

    const ACCOUNTS: [&str; 4] = ["initwitness", "initwitness1", "initwitness2", "nobody"];

    fn genesis() -> ChainState {
        let genesis = GenesisConfig {
            init_supply: INIT_SUPPLY,
            init_witness_count: 3,
            ..GenesisConfig::default()
        };
        ChainState::from_genesis(StoreConfig::default(), &genesis).unwrap()
    }

    fn accounts(state: &ChainState) -> Vec<Account> {
        state.store().iter::<Account>().unwrap().cloned().collect()
    }

    fn total_balance(state: &ChainState) -> i64 {
        state
            .store()
            .iter::<Account>()
            .unwrap()
            .map(|a| a.balance.amount)
            .sum()
    }

    #[derive(Debug, Clone)]
    enum Edit {
        Create(u8),
        Credit(u8, i64),
        Remove(u8),
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            (0u8..8).prop_map(Edit::Create),
            (0u8..8, 1i64..1_000).prop_map(|(n, amount)| Edit::Credit(n, amount)),
            (0u8..8).prop_map(Edit::Remove),
        ]
    }

    fn scratch(n: u8) -> AccountName {
        name(&format!("scratch{n}"))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_rolled_back_transfers_leave_no_trace(
            transfers in prop::collection::vec((0usize..4, 0usize..4, 1i64..400_000_000), 1..24)
        ) {
            let registry = EvaluatorRegistry::new();
            let mut state = genesis();
            let before = accounts(&state);
            let supply = total_balance(&state);

            let session = state.begin_session();
            for (from, to, amount) in transfers {
                if from == to {
                    continue;
                }
                let op = transfer(ACCOUNTS[from], ACCOUNTS[to], amount);
                // Overdrafts and unknown accounts fail and roll back on their own.
                let _ = state.with_session(|s| registry.apply_operation(s, &op));
                prop_assert_eq!(total_balance(&state), supply);
            }
            state.rollback(session).unwrap();

            prop_assert_eq!(accounts(&state), before.clone());
            for account in &before {
                prop_assert_eq!(state.find_account(&account.name).unwrap(), Some(account));
            }
            prop_assert!(state.find_account(&name("nobody")).unwrap().is_none());
            prop_assert_eq!(state.store().open_session_count(), 0);
        }

        #[test]
        fn prop_rolled_back_store_edits_leave_no_trace(edits in prop::collection::vec(edit(), 1..32)) {
            let mut state = genesis();
            let before = accounts(&state);
            let memo_key = public("scratch");
            let created = state.head_block_time().unwrap();
            let mut model: BTreeMap<AccountName, i64> = BTreeMap::new();

            let session = state.begin_session();
            for edit in edits {
                match edit {
                    Edit::Create(n) => {
                        let account = scratch(n);
                        let result = state.store_mut().with_session(|s| {
                            s.create(|id| Account::new(id, account.clone(), memo_key, created))
                        });
                        if model.contains_key(&account) {
                            prop_assert_eq!(result.unwrap_err().code(), "uniqueness_violation");
                        } else {
                            prop_assert!(result.is_ok());
                            model.insert(account, 0);
                        }
                    }
                    Edit::Credit(n, amount) => {
                        let account = scratch(n);
                        if let Some(id) = state.find_account(&account).unwrap().map(|a| a.id) {
                            state
                                .store_mut()
                                .modify(id, |a: &mut Account| a.balance = Asset::cedar(a.balance.amount + amount))
                                .unwrap();
                            *model.entry(account).or_default() += amount;
                        }
                    }
                    Edit::Remove(n) => {
                        let account = scratch(n);
                        if let Some(id) = state.find_account(&account).unwrap().map(|a| a.id) {
                            state.store_mut().remove(id).unwrap();
                            model.remove(&account);
                        }
                    }
                }

                for n in 0..8 {
                    let account = scratch(n);
                    let found = state.find_account(&account).unwrap().map(|a| a.balance.amount);
                    prop_assert_eq!(found, model.get(&account).copied());
                }
            }
            state.rollback(session).unwrap();

            prop_assert_eq!(accounts(&state), before);
            for n in 0..8 {
                prop_assert!(state.find_account(&scratch(n)).unwrap().is_none());
            }
        }
    }
}
