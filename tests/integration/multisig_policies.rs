use anyhow::Result;
use airgap_wallet::database::traits::{KeyRecordOperations, TxOperations};
use airgap_wallet::handoff::TxFileName;
use airgap_wallet::processor::{CreateOutcome, CreatedTx};
use airgap_wallet::types::{AccountType, TxType};
use airgap_wallet::wallet::SignatureWallet;

use crate::common::{
    prepare_accounts_with_cosigners, roles_with_deposit_policy, watch_addresses, Roles, COIN,
};

fn auth_pubkey(wallet: &SignatureWallet, account: AccountType) -> Result<String> {
    let record = wallet
        .database()
        .connection()
        .key_records(COIN, account)?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("{} key not derived", account))?;
    Ok(record.full_public_key)
}

/// Sweep the first deposit address into payment
fn deposit_sweep(r: &mut Roles) -> Result<CreatedTx> {
    let deposits = watch_addresses(r, AccountType::Deposit)?;
    r.node.fund(&deposits[0], "deposit", 25_000_000, 6);
    match r.watch.create_transfer(
        &r.node,
        AccountType::Deposit,
        AccountType::Payment,
        0,
        1.0,
    )? {
        CreateOutcome::Created(created) => Ok(created),
        other => panic!("expected a new transaction, got {:?}", other),
    }
}

#[test]
fn test_two_of_three_registration_and_signing() -> Result<()> {
    let (mut r, mut cosigners) = roles_with_deposit_policy(2, &["auth1", "auth2"])?;
    prepare_accounts_with_cosigners(&mut r, &mut cosigners, 2)?;

    let auth1 = auth_pubkey(&r.signature, AccountType::Auth(1))?;
    let auth2 = auth_pubkey(&cosigners[0], AccountType::Auth(2))?;
    let deposit_keys = r
        .keygen
        .database()
        .connection()
        .key_records(COIN, AccountType::Deposit)?;

    {
        let calls = r.node.multisig_calls.borrow();
        assert_eq!(calls.len(), 2);
        for ((required, keys, label), record) in calls.iter().zip(&deposit_keys) {
            assert_eq!(*required, 2);
            assert_eq!(keys.len(), 3);
            assert_eq!(
                keys,
                &vec![record.full_public_key.clone(), auth1.clone(), auth2.clone()]
            );
            assert_eq!(label, "multi_deposit");
        }
    }

    let created = deposit_sweep(&mut r)?;
    let first = r.keygen.sign(&r.node, &created.path)?;
    assert!(!first.is_signed);
    assert_eq!(TxFileName::parse(&first.path)?.round, 1);

    // Either authorization leg completes a 2-of-3 input; auth2 does it here
    let second = cosigners[0].sign(&r.node, &first.path)?;
    assert!(second.is_signed);
    let name = TxFileName::parse(&second.path)?;
    assert_eq!(name.tx_type, TxType::Signed);
    assert_eq!(name.round, 1);

    r.watch.send(&r.node, &second.path)?;
    assert_eq!(
        r.watch
            .database()
            .connection()
            .tx_by_id(created.tx_id)?
            .map(|t| t.tx_type),
        Some(TxType::Sent)
    );
    Ok(())
}

#[test]
fn test_three_of_three_needs_every_round() -> Result<()> {
    let (mut r, mut cosigners) = roles_with_deposit_policy(3, &["auth1", "auth2"])?;
    prepare_accounts_with_cosigners(&mut r, &mut cosigners, 1)?;

    {
        let calls = r.node.multisig_calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 3);
        assert_eq!(calls[0].1.len(), 3);
    }

    let created = deposit_sweep(&mut r)?;

    let first = r.keygen.sign(&r.node, &created.path)?;
    assert!(!first.is_signed);
    assert_eq!(TxFileName::parse(&first.path)?.round, 1);

    let second = r.signature.sign(&r.node, &first.path)?;
    assert!(!second.is_signed);
    let second_name = TxFileName::parse(&second.path)?;
    assert_eq!(second_name.tx_type, TxType::Unsigned);
    assert_eq!(second_name.round, 2);
    assert_eq!(second_name.tx_id, created.tx_id);

    // Two of three signatures cannot be broadcast
    assert!(r.watch.send(&r.node, &second.path).is_err());
    assert!(r.node.sent.borrow().is_empty());

    let third = cosigners[0].sign(&r.node, &second.path)?;
    assert!(third.is_signed);
    let third_name = TxFileName::parse(&third.path)?;
    assert_eq!(third_name.tx_type, TxType::Signed);
    assert_eq!(third_name.round, 2);

    let sent = r.watch.send(&r.node, &third.path)?;
    assert_eq!(r.node.sent.borrow().as_slice(), &[sent.sent_hash]);
    Ok(())
}
