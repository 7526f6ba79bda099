use anyhow::Result;
use airgap_wallet::database::traits::{TxOperations, WatchAddressOperations};
use airgap_wallet::handoff::{read_tx_file, TxFileName};
use airgap_wallet::processor::{CreateOutcome, FeeCalculator};
use airgap_wallet::types::{AccountType, ActionType, AddrStatus, TxType};
use std::fs;

use crate::common::{prepare_accounts, roles, watch_addresses, COIN};

/// Client funds are swept to the deposit multisig address, signed by
/// Keygen alone (client keys are single-key), broadcast and confirmed.
#[test]
fn test_full_deposit_scenario() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 2)?;

    let clients = watch_addresses(&r, AccountType::Client)?;
    let deposits = watch_addresses(&r, AccountType::Deposit)?;
    assert_eq!(clients.len(), 2);
    assert_eq!(deposits.len(), 2);

    r.node.fund(&clients[0], "client", 40_000_000, 6);
    r.node.fund(&clients[1], "client", 60_000_000, 3);

    let created = match r.watch.create_deposit(&r.node, 1.0)? {
        CreateOutcome::Created(created) => created,
        other => panic!("expected a new transaction, got {:?}", other),
    };
    assert_eq!(created.total_input, 100_000_000);
    assert_eq!(created.total_output, created.total_input - created.fee);
    assert!(created.fee > 0);

    let name = TxFileName::parse(&created.path)?;
    assert_eq!(name.action, ActionType::Deposit);
    assert_eq!(name.tx_type, TxType::Unsigned);
    assert_eq!(name.round, 0);
    let unsigned = read_tx_file(&created.path, TxType::Unsigned)?;
    let context = unsigned.context.expect("unsigned file carries context");
    assert_eq!(context.sender_account, AccountType::Client);
    assert_eq!(context.addrs, clients);

    let watch_conn = r.watch.database().connection();
    let outputs = watch_conn.tx_outputs(created.tx_id)?;
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].output_address, deposits[0]);
    assert_eq!(outputs[0].output_amount, created.total_output);

    // Client keys are single-key: the first round completes the transaction
    let signed = r.keygen.sign(&r.node, &created.path)?;
    assert!(signed.is_signed);
    let signed_name = TxFileName::parse(&signed.path)?;
    assert_eq!(signed_name.tx_type, TxType::Signed);
    assert_eq!(signed_name.tx_id, created.tx_id);
    assert!(!fs::read_to_string(&signed.path)?.contains(','));

    let sent = r.watch.send(&r.node, &signed.path)?;
    assert_eq!(r.node.sent.borrow().as_slice(), &[sent.sent_hash.clone()]);
    let envelope = r
        .watch
        .database()
        .connection()
        .tx_by_id(created.tx_id)?
        .expect("envelope stored");
    assert_eq!(envelope.tx_type, TxType::Sent);
    assert_eq!(envelope.sent_hash.as_deref(), Some(sent.sent_hash.as_str()));

    // The receiving address is used up; the next deposit goes to the next one
    let next = r
        .watch
        .database()
        .connection()
        .unallocated_watch_address(COIN, AccountType::Deposit)?
        .expect("second deposit address");
    assert_eq!(next.wallet_address, deposits[1]);

    // Sending the same file again is refused
    assert!(r.watch.send(&r.node, &signed.path).is_err());

    r.node.set_confirmations(&sent.sent_hash, 5);
    let (confirmed, _) = r.watch.monitor(&r.node)?;
    assert_eq!(confirmed.skipped, 1);

    r.node.set_confirmations(&sent.sent_hash, 6);
    let (confirmed, notified) = r.watch.monitor(&r.node)?;
    assert_eq!(confirmed.processed, 1);
    assert_eq!(notified.processed, 1);
    let envelope = r
        .watch
        .database()
        .connection()
        .tx_by_id(created.tx_id)?
        .expect("envelope stored");
    assert_eq!(envelope.tx_type, TxType::Notified);

    Ok(())
}

#[test]
fn test_rebuilding_identical_deposit_is_skipped() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 1)?;
    let clients = watch_addresses(&r, AccountType::Client)?;
    r.node.fund(&clients[0], "client", 10_000_000, 6);

    let first = match r.watch.create_deposit(&r.node, 1.0)? {
        CreateOutcome::Created(created) => created,
        other => panic!("expected a new transaction, got {:?}", other),
    };
    let files_before = fs::read_dir(&r.config.file_path.tx)?.count();

    assert_eq!(
        r.watch.create_deposit(&r.node, 1.0)?,
        CreateOutcome::Duplicate {
            tx_id: first.tx_id
        }
    );
    assert_eq!(fs::read_dir(&r.config.file_path.tx)?.count(), files_before);
    Ok(())
}

#[test]
fn test_deposit_without_funds_does_nothing() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 1)?;
    // Unconfirmed outputs are not spent
    let clients = watch_addresses(&r, AccountType::Client)?;
    r.node.fund(&clients[0], "client", 10_000_000, 0);

    assert_eq!(r.watch.create_deposit(&r.node, 1.0)?, CreateOutcome::NothingToDo);
    assert!(!r.config.file_path.tx.exists());
    Ok(())
}

#[test]
fn test_fee_multiplier_is_clamped() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 1)?;
    let clients = watch_addresses(&r, AccountType::Client)?;
    r.node.fund(&clients[0], "client", 10_000_000, 6);

    let created = match r.watch.create_deposit(&r.node, 10.0)? {
        CreateOutcome::Created(created) => created,
        other => panic!("expected a new transaction, got {:?}", other),
    };

    // Output amounts do not change the size, so the stored transaction
    // has the size the fee was computed from.
    let envelope = r
        .watch
        .database()
        .connection()
        .tx_by_id(created.tx_id)?
        .expect("envelope stored");
    let tx: bitcoin::Transaction =
        bitcoin::consensus::deserialize(&hex::decode(&envelope.unsigned_hex)?)?;
    let calculator = FeeCalculator::new(&r.config.fee);
    let estimate = calculator.estimate(&r.node, tx.vsize())?;

    assert_eq!(created.fee, calculator.adjust(estimate, 1.5));
    assert_eq!(created.fee, (estimate as f64 * 1.5).ceil() as u64);
    assert_eq!(created.total_output, 10_000_000 - created.fee);
    Ok(())
}

#[test]
fn test_fee_larger_than_funds_is_rejected() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 1)?;
    let clients = watch_addresses(&r, AccountType::Client)?;
    r.node.fund(&clients[0], "client", 150, 6);

    let err = r.watch.create_deposit(&r.node, 1.0).unwrap_err();
    assert!(matches!(err, airgap_wallet::errors::AppError::Amount(_)), "{}", err);
    assert!(!r.config.file_path.tx.exists());
    Ok(())
}

#[test]
fn test_cold_side_statuses_after_setup() -> Result<()> {
    use airgap_wallet::database::traits::KeyRecordOperations;

    let mut r = roles()?;
    prepare_accounts(&mut r, 2)?;
    let conn = r.keygen.database().connection();

    for account in [AccountType::Client, AccountType::Deposit, AccountType::Payment] {
        let records = conn.key_records(COIN, account)?;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|k| k.status == AddrStatus::AddressExported));
    }
    let deposits = conn.key_records(COIN, AccountType::Deposit)?;
    assert!(deposits
        .iter()
        .all(|k| k.multisig_address.is_some() && k.redeem_script.is_some()));
    assert!(conn
        .key_records(COIN, AccountType::Client)?
        .iter()
        .all(|k| k.multisig_address.is_none()));

    // Watch tracks the multisig address, not the single-key one
    let watched = watch_addresses(&r, AccountType::Deposit)?;
    assert_eq!(
        watched,
        deposits
            .iter()
            .filter_map(|k| k.multisig_address.clone())
            .collect::<Vec<_>>()
    );
    assert_eq!(r.node.watched_label(&watched[0]).as_deref(), Some("deposit"));

    let calls = r.node.multisig_calls.borrow();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(required, keys, label)| *required == 2
        && keys.len() == 2
        && label == "multi_deposit"));
    Ok(())
}
