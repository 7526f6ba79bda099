use anyhow::Result;
use airgap_wallet::database::traits::{KeyRecordOperations, TxOperations, WatchAddressOperations};
use airgap_wallet::errors::AppError;
use airgap_wallet::handoff::{read_tx_file, TxFileName};
use airgap_wallet::processor::CreateOutcome;
use airgap_wallet::types::{AccountType, AddrStatus, TxType};

use crate::common::{prepare_accounts, roles, watch_addresses, COIN, KEYGEN_SEED, SIGNATURE_SEED};

/// A 2-of-2 deposit output needs Keygen's round and Signature's round
#[test]
fn test_two_of_two_signing_rounds() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 2)?;
    let deposits = watch_addresses(&r, AccountType::Deposit)?;
    let payments = watch_addresses(&r, AccountType::Payment)?;
    r.node.fund(&deposits[0], "deposit", 30_000_000, 6);

    let created = match r.watch.create_transfer(
        &r.node,
        AccountType::Deposit,
        AccountType::Payment,
        0,
        1.0,
    )? {
        CreateOutcome::Created(created) => created,
        other => panic!("expected a new transaction, got {:?}", other),
    };
    let round0 = read_tx_file(&created.path, TxType::Unsigned)?;
    let context = round0.context.expect("context");
    assert!(!context.has_all_redeem_scripts());

    // Signature never signs a fresh file
    assert!(matches!(
        r.signature.sign(&r.node, &created.path),
        Err(AppError::InvalidHandoffFile { .. })
    ));

    let first = r.keygen.sign(&r.node, &created.path)?;
    assert!(!first.is_signed);
    let first_name = TxFileName::parse(&first.path)?;
    assert_eq!(first_name.tx_type, TxType::Unsigned);
    assert_eq!(first_name.round, 1);
    assert_eq!(first_name.tx_id, created.tx_id);

    // Round 1 carries the redeem script Keygen stored for the address
    let round1 = read_tx_file(&first.path, TxType::Unsigned)?;
    let context = round1.context.expect("context");
    assert!(context.has_all_redeem_scripts());
    let record = r
        .keygen
        .database()
        .connection()
        .key_records_by_multisig_address(COIN, &deposits[..1])?
        .pop()
        .expect("deposit record");
    assert_eq!(Some(context.prev_txs[0].redeem_script.clone()), record.redeem_script);

    // Keygen does not sign its own output again
    assert!(r.keygen.sign(&r.node, &first.path).is_err());

    let second = r.signature.sign(&r.node, &first.path)?;
    assert!(second.is_signed);
    let second_name = TxFileName::parse(&second.path)?;
    assert_eq!(second_name.tx_type, TxType::Signed);
    assert_eq!(second_name.round, 1);

    // The partially signed file cannot be broadcast
    assert!(r.watch.send(&r.node, &first.path).is_err());

    r.watch.send(&r.node, &second.path)?;
    let conn = r.watch.database().connection();
    assert_eq!(conn.tx_by_id(created.tx_id)?.map(|t| t.tx_type), Some(TxType::Sent));
    let payment = conn
        .watch_addresses(COIN, AccountType::Payment)?
        .into_iter()
        .find(|a| a.wallet_address == payments[0])
        .expect("payment address");
    assert!(payment.is_allocated);
    Ok(())
}

/// Multisig addresses resolved by Signature and imported by Keygen
#[test]
fn test_signature_side_multisig_registration() -> Result<()> {
    let r = roles()?;
    let (mut keygen, mut signature, node) = (r.keygen, r.signature, r.node);

    keygen.store_seed(KEYGEN_SEED)?;
    signature.store_seed(SIGNATURE_SEED)?;
    let auth_key = signature.create_key()?;
    signature.export_auth_pubkey()?;

    keygen.create_keys(AccountType::Deposit, 2)?;
    keygen.import_privkeys(&node, AccountType::Deposit)?;
    let pubkey_file = keygen
        .export_pubkeys(AccountType::Deposit)?
        .expect("pubkey file");
    assert_eq!(keygen.export_pubkeys(AccountType::Deposit)?, None);

    assert_eq!(signature.import_pubkeys(&pubkey_file)?.processed, 2);
    assert_eq!(signature.import_pubkeys(&pubkey_file)?.skipped, 2);
    assert_eq!(signature.create_multisig(&node)?.processed, 2);

    let keygen_records = keygen
        .database()
        .connection()
        .key_records(COIN, AccountType::Deposit)?;
    for ((required, keys, label), record) in node.multisig_calls.borrow().iter().zip(&keygen_records) {
        assert_eq!(*required, 2);
        assert_eq!(keys, &vec![record.full_public_key.clone(), auth_key.full_public_key.clone()]);
        assert_eq!(label, "multi_deposit");
    }

    let multisig_file = signature
        .export_multisig(AccountType::Deposit)?
        .expect("multisig file");
    assert_eq!(signature.export_multisig(AccountType::Deposit)?, None);

    assert_eq!(keygen.import_multisig(&multisig_file)?.processed, 2);
    assert_eq!(keygen.import_multisig(&multisig_file)?.skipped, 2);

    let records = keygen
        .database()
        .connection()
        .key_records(COIN, AccountType::Deposit)?;
    assert!(records
        .iter()
        .all(|k| k.status == AddrStatus::MultisigImported && k.multisig_address.is_some()));
    Ok(())
}

#[test]
fn test_signature_wallet_holds_a_single_key() -> Result<()> {
    let mut r = roles()?;
    r.signature.store_seed(SIGNATURE_SEED)?;
    r.signature.create_key()?;
    assert!(matches!(
        r.signature.create_key(),
        Err(AppError::Validation(_))
    ));

    r.keygen.store_seed(KEYGEN_SEED)?;
    assert!(r.keygen.create_keys(AccountType::Auth(1), 1).is_err());
    Ok(())
}

#[test]
fn test_pubkey_export_only_for_multisig_accounts() -> Result<()> {
    let mut r = roles()?;
    r.keygen.store_seed(KEYGEN_SEED)?;
    r.keygen.create_keys(AccountType::Client, 1)?;
    r.keygen.import_privkeys(&r.node, AccountType::Client)?;
    assert!(matches!(
        r.keygen.export_pubkeys(AccountType::Client),
        Err(AppError::Validation(_))
    ));
    Ok(())
}

#[test]
fn test_renamed_handoff_files_are_refused() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 1)?;
    r.keygen.create_keys(AccountType::Deposit, 1)?;
    r.keygen.import_privkeys(&r.node, AccountType::Deposit)?;
    r.keygen.export_pubkeys(AccountType::Deposit)?;
    r.keygen.create_multisig(&r.node, AccountType::Deposit)?;
    let deposit_file = r
        .keygen
        .export_addresses(AccountType::Deposit)?
        .expect("address file");

    // Same body, file name claiming the payment account
    let file_name = deposit_file
        .file_name()
        .and_then(|n| n.to_str())
        .expect("file name")
        .replacen("_deposit_", "_payment_", 1);
    let renamed = deposit_file.with_file_name(file_name);
    std::fs::rename(&deposit_file, &renamed)?;

    let before = watch_addresses(&r, AccountType::Deposit)?.len();
    assert!(matches!(
        r.watch.import_addresses(&r.node, &renamed),
        Err(AppError::InvalidHandoffFile { .. })
    ));
    assert_eq!(watch_addresses(&r, AccountType::Deposit)?.len(), before);
    assert_eq!(watch_addresses(&r, AccountType::Payment)?.len(), 1);

    // An address export is not a multisig file
    assert!(r.keygen.import_multisig(&renamed).is_err());
    Ok(())
}
