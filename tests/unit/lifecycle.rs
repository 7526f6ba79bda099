use anyhow::Result;
use airgap_wallet::database::traits::KeyRecordOperations;
use airgap_wallet::errors::AppError;
use airgap_wallet::processor::{AddressLifecycle, KeyGenerator};
use airgap_wallet::types::{AccountPolicy, AccountType, AddrStatus, MultisigPolicy};
use bitcoin::Network;
use std::collections::BTreeMap;

use crate::common::{role_database, COIN, KEYGEN_SEED};

const ALL: [AddrStatus; 5] = [
    AddrStatus::Generated,
    AddrStatus::PrivKeyImported,
    AddrStatus::PubkeyExported,
    AddrStatus::MultisigImported,
    AddrStatus::AddressExported,
];

fn deposit_multisig() -> Result<AccountPolicy> {
    let mut policies = BTreeMap::new();
    policies.insert(
        AccountType::Deposit,
        MultisigPolicy {
            required: 2,
            auth_accounts: vec![AccountType::Auth(1)],
        },
    );
    Ok(AccountPolicy::new(policies)?)
}

#[test]
fn test_transitions_form_a_total_order() {
    for is_multisig in [true, false] {
        let mut path = vec![AddrStatus::Generated];
        while let Some(next) = path.last().and_then(|s| s.next(is_multisig)) {
            assert!(next > *path.last().unwrap_or(&next));
            path.push(next);
        }
        assert_eq!(path.last(), Some(&AddrStatus::AddressExported));
        assert_eq!(path.len(), if is_multisig { 5 } else { 3 });

        // Only the listed successor is legal; nothing moves backwards
        for from in ALL {
            for to in ALL {
                let expected = from.next(is_multisig) == Some(to);
                assert_eq!(from.can_advance(to, is_multisig), expected, "{} -> {}", from, to);
                if to <= from {
                    assert!(!from.can_advance(to, is_multisig));
                }
            }
        }
    }
}

#[test]
fn test_advance_refuses_skips_and_stale_records() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut db = role_database(dir.path(), "keygen")?;
    let generator = KeyGenerator::new(COIN, Network::Regtest);
    generator.store_seed(&db, KEYGEN_SEED)?;
    generator.generate_keys(&mut db, AccountType::Deposit, 1)?;

    let lifecycle = AddressLifecycle::new(COIN, deposit_multisig()?);
    let conn = db.connection();
    let record = conn.key_records(COIN, AccountType::Deposit)?.remove(0);

    // Multisig accounts cannot jump to the address export
    let mut imported = record.clone();
    lifecycle.advance(conn, &record, AddrStatus::PrivKeyImported)?;
    imported.status = AddrStatus::PrivKeyImported;
    assert!(matches!(
        lifecycle.advance(conn, &imported, AddrStatus::AddressExported),
        Err(AppError::InvalidTransition { .. })
    ));

    // The stored row has moved on; the stale copy cannot advance it again
    assert!(matches!(
        lifecycle.advance(conn, &record, AddrStatus::PrivKeyImported),
        Err(AppError::InvalidTransition { .. })
    ));

    lifecycle.advance(conn, &imported, AddrStatus::PubkeyExported)?;
    let queue = lifecycle.select_by_status(conn, AccountType::Deposit, AddrStatus::PubkeyExported)?;
    assert_eq!(queue.len(), 1);
    assert!(lifecycle
        .select_by_status(conn, AccountType::Deposit, AddrStatus::PrivKeyImported)?
        .is_empty());
    Ok(())
}
