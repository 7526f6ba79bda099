use anyhow::Result;
use airgap_wallet::crypto::HdKeyDeriver;
use airgap_wallet::database::traits::KeyRecordOperations;
use airgap_wallet::errors::AppError;
use airgap_wallet::processor::KeyGenerator;
use airgap_wallet::types::{AccountType, AddrStatus};
use bitcoin::Network;

use crate::common::{role_database, COIN, KEYGEN_SEED};

#[test]
fn test_derivation_ranges_are_gap_free() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut db = role_database(dir.path(), "keygen")?;
    let generator = KeyGenerator::new(COIN, Network::Regtest);
    generator.store_seed(&db, KEYGEN_SEED)?;

    generator.generate_keys(&mut db, AccountType::Deposit, 3)?;
    generator.generate_keys(&mut db, AccountType::Deposit, 2)?;
    generator.generate_keys(&mut db, AccountType::Payment, 1)?;

    let records = db.connection().key_records(COIN, AccountType::Deposit)?;
    let indices: Vec<u32> = records.iter().map(|k| k.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    assert!(records.iter().all(|k| k.status == AddrStatus::Generated));

    // Two calls give the same keys as one call over the whole range
    let expected = generator.deriver().derive_range(
        &hex::decode(KEYGEN_SEED)?,
        AccountType::Deposit,
        1,
        5,
    )?;
    for (record, key) in records.iter().zip(&expected) {
        assert_eq!(record.full_public_key, key.full_public_key);
        assert_eq!(record.p2sh_segwit_address, key.p2sh_segwit_address);
        assert_eq!(record.wif, key.wif);
    }

    // Accounts are numbered independently
    assert_eq!(
        db.connection().max_key_index(COIN, AccountType::Payment)?,
        Some(1)
    );
    Ok(())
}

#[test]
fn test_first_key_of_account_has_index_one() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut db = role_database(dir.path(), "keygen")?;
    let generator = KeyGenerator::new(COIN, Network::Regtest);
    generator.store_seed(&db, KEYGEN_SEED)?;

    let keys = generator.generate_keys(&mut db, AccountType::Deposit, 1)?;
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].index, 1);
    assert_eq!(
        db.connection().max_key_index(COIN, AccountType::Deposit)?,
        Some(1)
    );
    Ok(())
}

#[test]
fn test_accounts_derive_distinct_keys() -> Result<()> {
    let deriver = HdKeyDeriver::new(Network::Regtest);
    let seed = hex::decode(KEYGEN_SEED)?;
    let client = deriver.derive_range(&seed, AccountType::Client, 0, 1)?;
    let deposit = deriver.derive_range(&seed, AccountType::Deposit, 0, 1)?;
    let auth = deriver.derive_range(&seed, AccountType::Auth(1), 0, 1)?;
    assert_ne!(client[0].full_public_key, deposit[0].full_public_key);
    assert_ne!(deposit[0].full_public_key, auth[0].full_public_key);
    assert!(client[0].bech32_address.starts_with("bcrt1"));
    Ok(())
}

#[test]
fn test_wallet_network_is_enforced() -> Result<()> {
    let seed = hex::decode(KEYGEN_SEED)?;
    let mainnet = HdKeyDeriver::new(Network::Bitcoin);
    let regtest = HdKeyDeriver::new(Network::Regtest);
    let key = mainnet.derive_range(&seed, AccountType::Client, 0, 1)?.remove(0);

    assert!(matches!(
        regtest.decode_wif(&key.wif),
        Err(AppError::NetworkMismatch { .. })
    ));
    assert!(matches!(
        regtest.decode_wif("not-a-wif"),
        Err(AppError::CorruptKey(_))
    ));
    assert!(regtest.check_address(&key.p2pkh_address).is_err());
    Ok(())
}

#[test]
fn test_seed_length_is_checked() {
    let deriver = HdKeyDeriver::new(Network::Regtest);
    assert!(matches!(
        deriver.derive_range(&[7u8; 8], AccountType::Client, 0, 1),
        Err(AppError::MalformedSeed { len: 8 })
    ));
    assert!(deriver
        .derive_range(&[7u8; 33], AccountType::Client, 0, 1)
        .is_err());
    assert!(deriver
        .derive_range(&[7u8; 16], AccountType::Anonymous, 0, 1)
        .is_err());
}
