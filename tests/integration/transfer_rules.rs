use anyhow::Result;
use airgap_wallet::errors::AppError;
use airgap_wallet::processor::CreateOutcome;
use airgap_wallet::types::AccountType;

use crate::common::{prepare_accounts, roles, watch_addresses};

#[test]
fn test_transfer_account_rules() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 1)?;

    for (sender, receiver) in [
        (AccountType::Client, AccountType::Deposit),
        (AccountType::Deposit, AccountType::Client),
        (AccountType::Payment, AccountType::Payment),
        (AccountType::Auth(1), AccountType::Payment),
        (AccountType::Payment, AccountType::Auth(1)),
    ] {
        let result = r.watch.create_transfer(&r.node, sender, receiver, 0, 1.0);
        assert!(
            matches!(result, Err(AppError::Validation(_))),
            "{} -> {} should be rejected",
            sender,
            receiver
        );
    }
    Ok(())
}

#[test]
fn test_transfer_needs_receiver_address() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 1)?;
    let payments = watch_addresses(&r, AccountType::Payment)?;
    r.node.fund(&payments[0], "payment", 5_000_000, 6);

    // No stored addresses were ever imported
    assert!(matches!(
        r.watch
            .create_transfer(&r.node, AccountType::Payment, AccountType::Stored, 0, 1.0),
        Err(AppError::Validation(_))
    ));
    Ok(())
}

#[test]
fn test_partial_transfer_returns_change() -> Result<()> {
    let mut r = roles()?;
    prepare_accounts(&mut r, 1)?;
    let payments = watch_addresses(&r, AccountType::Payment)?;
    r.node.fund(&payments[0], "payment", 5_000_000, 6);

    let created = match r.watch.create_transfer(
        &r.node,
        AccountType::Payment,
        AccountType::Deposit,
        1_000_000,
        1.0,
    )? {
        CreateOutcome::Created(created) => created,
        other => panic!("expected a new transaction, got {:?}", other),
    };
    assert_eq!(created.total_input, 5_000_000);
    assert_eq!(created.total_output, 5_000_000 - created.fee);

    let signed = r.keygen.sign(&r.node, &created.path)?;
    assert!(signed.is_signed);
    Ok(())
}
