//! End-to-end behavior of the three bridge operations against mocked nodes.

mod common;

use std::{str::FromStr, sync::Arc};

use alloy_primitives::{TxHash, U256};
use bitcoin::{hashes::Hash, Address, Amount, FeeRate, Network, Txid};
use common::*;
use mockall::predicate::eq;
use tokio::sync::Barrier;
use via_batch_verifier::MockProofOracle;
use via_bridge::{
    BridgeError, ErrorCategory, Layer, RejectionReason, SubmissionStatus, VerificationOutcome,
};
use via_btcio::{
    reader::{L1BatchDaReference, ProofDaReference},
    test_utils::{batch_reveal_tx, proof_reveal_tx},
    writer::{BitcoinDepositSubmitter, DepositError, DepositParams, MockDepositSubmitter},
    MockBitcoinRpc, Utxo,
};
use via_config::{ConfirmationWait, DepositConfig};
use via_l2_client::{L2ClientError, MockL2BaseToken, SignedWithdrawal, WithdrawalStatus};
use via_primitives::{AmountError, L2Address};

fn idle_deposits() -> MockDepositSubmitter {
    let mut deposits = MockDepositSubmitter::new();
    deposits.expect_prepare_deposit().times(0);
    deposits.expect_broadcast_deposit().times(0);
    deposits.expect_submit_deposit().times(0);
    deposits
}

fn idle_l2() -> MockL2BaseToken {
    let mut l2 = MockL2BaseToken::new();
    l2.expect_balance_of().times(0);
    l2.expect_prepare_withdrawal().times(0);
    l2.expect_broadcast_withdrawal().times(0);
    l2.expect_wait_for_confirmation().times(0);
    l2.expect_submit_withdrawal().times(0);
    l2
}

fn idle_rpc() -> MockBitcoinRpc {
    let mut rpc = MockBitcoinRpc::new();
    rpc.expect_fetch_utxos().times(0);
    rpc.expect_estimate_fee_rate().times(0);
    rpc.expect_broadcast().times(0);
    rpc.expect_get_transaction().times(0);
    rpc
}

fn idle_oracle() -> MockProofOracle {
    let mut oracle = MockProofOracle::new();
    oracle.expect_verify().times(0);
    oracle
}

fn funded_l2(balance: U256) -> MockL2BaseToken {
    let mut l2 = MockL2BaseToken::new();
    l2.expect_signer_address()
        .returning(|| L2Address::parse(L2_RECEIVER).unwrap());
    l2.expect_balance_of().returning(move |_| Ok(balance));
    l2
}

#[tokio::test]
async fn deposit_with_non_numeric_amount_makes_no_rpc_call() {
    let bridge = bridge(
        idle_deposits(),
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );

    let err = bridge.deposit(&deposit_request("abc")).await.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::InvalidAmount(AmountError::NotANumber(_))
    ));
    assert_eq!(err.category(), ErrorCategory::Input);
}

#[tokio::test]
async fn invalid_amounts_never_reach_the_network() {
    let bridge = bridge(
        idle_deposits(),
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );

    for raw in ["", "NaN", "nan", "inf", "-1", "0", "0.000000001", "1e400", "12abc"] {
        let err = bridge.deposit(&deposit_request(raw)).await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidAmount(_)), "deposit {raw:?}: {err}");

        let err = bridge.withdraw(&withdrawal_request(raw)).await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidAmount(_)), "withdraw {raw:?}: {err}");
    }
}

#[tokio::test]
async fn deposit_with_malformed_receiver_fails_fast() {
    let bridge = bridge(
        idle_deposits(),
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );

    let mut request = deposit_request("0.5");
    request.l2_receiver = "0x1234".to_owned();
    let err = bridge.deposit(&request).await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidAddress(_)));
}

#[tokio::test]
async fn deposit_of_half_a_btc_is_broadcast() {
    let bridge_spk = Address::from_str(BRIDGE_ADDRESS)
        .unwrap()
        .assume_checked()
        .script_pubkey();

    let mut node = MockBitcoinRpc::new();
    node.expect_fetch_utxos().times(1).returning(|addr| {
        Ok(vec![Utxo {
            txid: Txid::from_byte_array([1; 32]),
            vout: 0,
            amount: Amount::ONE_BTC,
            script_pubkey: addr.script_pubkey(),
        }])
    });
    node.expect_estimate_fee_rate()
        .with(eq(6))
        .times(1)
        .returning(|_| Ok(Some(FeeRate::from_sat_per_vb_unchecked(2))));
    node.expect_broadcast()
        .withf(move |tx| {
            tx.output[0].value == Amount::from_sat(50_000_000)
                && tx.output[0].script_pubkey == bridge_spk
                && tx.output[1].script_pubkey.is_op_return()
                && tx.input.iter().all(|txin| txin.witness.len() == 2)
        })
        .times(1)
        .returning(|tx| Ok(tx.compute_txid()));

    let config = DepositConfig {
        bridge_address: BRIDGE_ADDRESS.to_owned(),
        fallback_fee_rate: 10,
        fee_target_blocks: 6,
    };
    let params = DepositParams::from_config(&config, Network::Regtest).unwrap();
    let deposits = BitcoinDepositSubmitter::new(Arc::new(node), params);

    let bridge = bridge(
        deposits,
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );
    let receipt = bridge.deposit(&deposit_request("0.5")).await.unwrap();

    assert_eq!(receipt.layer, Layer::Bitcoin);
    assert_eq!(receipt.status, SubmissionStatus::Pending);
    assert!(Txid::from_str(&receipt.txid).is_ok());
}

#[tokio::test]
async fn deposit_rejection_is_reported() {
    let mut deposits = MockDepositSubmitter::new();
    deposits
        .expect_prepare_deposit()
        .times(1)
        .returning(|_, _, _| Ok(prepared_deposit(9)));
    deposits
        .expect_broadcast_deposit()
        .times(1)
        .returning(|_| {
            Err(DepositError::Rejected(
                "bad-txns-inputs-missingorspent (-25)".to_owned(),
            ))
        });

    let bridge = bridge(
        deposits,
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );
    let err = bridge.deposit(&deposit_request("0.5")).await.unwrap_err();
    assert_eq!(err.rejection_reason(), Some(RejectionReason::Rejected));
    assert!(err.to_string().contains("missingorspent"));
}

#[tokio::test]
async fn withdrawal_of_zero_is_rejected_before_contract_call() {
    let bridge = bridge(
        idle_deposits(),
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );

    let err = bridge.withdraw(&withdrawal_request("0")).await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidAmount(AmountError::Zero)));
}

#[tokio::test]
async fn withdrawal_to_another_network_is_rejected() {
    let bridge = bridge(
        idle_deposits(),
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );

    let mut request = withdrawal_request("0.1");
    request.l1_receiver = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq".to_owned();
    let err = bridge.withdraw(&request).await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidAddress(_)));

    request.l1_receiver = "  ".to_owned();
    let err = bridge.withdraw(&request).await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidAddress(_)));
}

#[tokio::test]
async fn withdrawal_sends_lossless_wire_value_and_waits() {
    // 0.5 BTC with an 18-decimal base token.
    let expected = U256::from(5u64) * U256::from(10u64).pow(U256::from(17u64));
    let tx_hash = TxHash::repeat_byte(0xab);

    let mut l2 = funded_l2(expected);
    l2.expect_prepare_withdrawal()
        .withf(move |value, receiver| *value == expected && receiver.as_str() == L1_RECEIVER)
        .times(1)
        .returning(move |value, _| {
            Ok(SignedWithdrawal::new(tx_hash, 0, value, Default::default()))
        });
    l2.expect_broadcast_withdrawal()
        .times(1)
        .returning(|signed| Ok(signed.tx_hash));
    l2.expect_wait_for_confirmation()
        .with(eq(tx_hash), eq(ConfirmationWait::Unbounded))
        .times(1)
        .returning(|_, _| {
            Ok(WithdrawalStatus::Confirmed {
                block_number: Some(77),
            })
        });

    let bridge = bridge(
        idle_deposits(),
        l2,
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::Unbounded,
    );
    let receipt = bridge.withdraw(&withdrawal_request("0.5")).await.unwrap();

    assert_eq!(receipt.layer, Layer::L2);
    assert_eq!(receipt.txid, tx_hash.to_string());
    assert_eq!(
        receipt.status,
        SubmissionStatus::Confirmed {
            block_number: Some(77)
        }
    );
    assert!(receipt.to_string().contains("block 77"));
}

#[tokio::test]
async fn withdrawal_above_balance_is_not_signed() {
    let mut l2 = funded_l2(U256::from(1u64));
    l2.expect_prepare_withdrawal().times(0);
    l2.expect_broadcast_withdrawal().times(0);

    let bridge = bridge(
        idle_deposits(),
        l2,
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );
    let err = bridge.withdraw(&withdrawal_request("0.1")).await.unwrap_err();
    assert_eq!(err.rejection_reason(), Some(RejectionReason::InsufficientFunds));
}

#[tokio::test]
async fn unreachable_rollup_is_a_network_error() {
    let mut l2 = MockL2BaseToken::new();
    l2.expect_signer_address()
        .returning(|| L2Address::parse(L2_RECEIVER).unwrap());
    l2.expect_balance_of()
        .returning(|_| Err(L2ClientError::Network("connection refused".into())));

    let bridge = bridge(
        idle_deposits(),
        l2,
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );
    let err = bridge.withdraw(&withdrawal_request("0.1")).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Network);
}

#[tokio::test]
async fn withdrawal_broadcast_lost_in_transit_is_indeterminate() {
    let tx_hash = TxHash::repeat_byte(0x5c);
    let mut l2 = funded_l2(U256::MAX);
    l2.expect_prepare_withdrawal()
        .times(1)
        .returning(move |value, _| {
            Ok(SignedWithdrawal::new(tx_hash, 0, value, Default::default()))
        });
    l2.expect_broadcast_withdrawal()
        .times(1)
        .returning(|_| Err(L2ClientError::Network("operation timed out".into())));
    l2.expect_wait_for_confirmation().times(0);

    let bridge = bridge(
        idle_deposits(),
        l2,
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::Unbounded,
    );
    let err = bridge.withdraw(&withdrawal_request("0.1")).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Ambiguous);
    match err {
        BridgeError::Indeterminate { txid, detail } => {
            assert_eq!(txid, tx_hash.to_string());
            assert!(detail.contains("timed out"));
        }
        other => panic!("expected indeterminate outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn deposit_broadcast_lost_in_transit_is_indeterminate() {
    let mut deposits = MockDepositSubmitter::new();
    deposits
        .expect_prepare_deposit()
        .times(1)
        .returning(|_, _, _| Ok(prepared_deposit(0x33)));
    deposits
        .expect_broadcast_deposit()
        .times(1)
        .returning(|_| Err(DepositError::Unavailable("connection reset by peer".to_owned())));

    let bridge = bridge(
        deposits,
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );
    let err = bridge.deposit(&deposit_request("0.5")).await.unwrap_err();
    match err {
        BridgeError::Indeterminate { txid, .. } => {
            assert_eq!(txid, prepared_deposit(0x33).txid.to_string());
        }
        other => panic!("expected indeterminate outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn deposit_prepare_without_node_is_a_network_error() {
    let mut deposits = MockDepositSubmitter::new();
    deposits
        .expect_prepare_deposit()
        .times(1)
        .returning(|_, _, _| Err(DepositError::Unavailable("connection refused".to_owned())));
    deposits.expect_broadcast_deposit().times(0);

    let bridge = bridge(
        deposits,
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );
    let err = bridge.deposit(&deposit_request("0.5")).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Network);
}

#[tokio::test]
async fn confirmation_timeout_is_indeterminate() {
    let tx_hash = TxHash::repeat_byte(0x01);
    let mut l2 = funded_l2(U256::MAX);
    l2.expect_prepare_withdrawal()
        .returning(move |value, _| {
            Ok(SignedWithdrawal::new(tx_hash, 3, value, Default::default()))
        });
    l2.expect_broadcast_withdrawal()
        .returning(|signed| Ok(signed.tx_hash));
    l2.expect_wait_for_confirmation()
        .returning(|hash, _| Err(L2ClientError::ConfirmationTimeout(hash)));

    let bridge = bridge(
        idle_deposits(),
        l2,
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::Bounded { timeout_secs: 1 },
    );
    let err = bridge.withdraw(&withdrawal_request("0.1")).await.unwrap_err();
    match err {
        BridgeError::Indeterminate { txid, .. } => assert_eq!(txid, tx_hash.to_string()),
        other => panic!("expected indeterminate outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn verify_unknown_reveal_is_not_found() {
    let bridge = bridge(
        idle_deposits(),
        idle_l2(),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );

    let outcome = bridge.verify_batch("nonexistent-tx-id").await.unwrap();
    assert!(matches!(outcome, VerificationOutcome::NotFound { .. }));

    let err = bridge
        .require_valid_batch("nonexistent-tx-id")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::BatchNotFound { .. }));
}

#[tokio::test]
async fn verify_absent_reveal_is_not_found() {
    let missing = Txid::from_byte_array([0x5a; 32]);
    let mut rpc = MockBitcoinRpc::new();
    rpc.expect_get_transaction()
        .with(eq(missing))
        .times(1)
        .returning(|_| Ok(None));

    let bridge = bridge(
        idle_deposits(),
        idle_l2(),
        rpc,
        idle_oracle(),
        ConfirmationWait::None,
    );
    let outcome = bridge.verify_batch(&missing.to_string()).await.unwrap();
    assert_eq!(outcome, VerificationOutcome::not_found(missing.to_string()));
}

#[tokio::test]
async fn verify_wrong_commitment_is_invalid_not_missing() {
    let proof_txid = Txid::from_byte_array([0x0a; 32]);
    let batch_txid = Txid::from_byte_array([0x0b; 32]);
    let proof = ProofDaReference {
        l1_batch_reveal_txid: batch_txid,
        da_identifier: "celestia".to_owned(),
        blob_id: "proof".to_owned(),
    };
    let batch = L1BatchDaReference {
        l1_batch_hash: [0xcd; 32],
        l1_batch_index: 5,
        da_identifier: "celestia".to_owned(),
        blob_id: "batch".to_owned(),
    };

    let mut rpc = MockBitcoinRpc::new();
    rpc.expect_get_transaction()
        .with(eq(proof_txid))
        .returning(move |_| Ok(Some(proof_reveal_tx(&proof))));
    rpc.expect_get_transaction()
        .with(eq(batch_txid))
        .returning(move |_| Ok(Some(batch_reveal_tx(&batch))));
    let mut oracle = MockProofOracle::new();
    oracle.expect_verify().times(1).returning(|_| Ok(false));

    let bridge = bridge(
        idle_deposits(),
        idle_l2(),
        rpc,
        oracle,
        ConfirmationWait::None,
    );
    let outcome = bridge.verify_batch(&proof_txid.to_string()).await.unwrap();
    assert!(matches!(outcome, VerificationOutcome::Invalid(_)));

    let err = outcome.into_result().map_err(BridgeError::from).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::VerificationFailed { l1_batch_index: 5 }
    ));
}

#[tokio::test]
async fn concurrent_withdrawals_from_one_key_cannot_share_a_nonce() {
    let node = FakeL2Node::new(U256::MAX);
    let barrier = Arc::new(Barrier::new(2));

    let first = bridge(
        idle_deposits(),
        FakeL2Client::new(1, Arc::clone(&node)).synchronized(Arc::clone(&barrier)),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );
    let second = bridge(
        idle_deposits(),
        FakeL2Client::new(2, Arc::clone(&node)).synchronized(barrier),
        idle_rpc(),
        idle_oracle(),
        ConfirmationWait::None,
    );

    let request = withdrawal_request("0.25");
    let (a, b) = tokio::join!(first.withdraw(&request), second.withdraw(&request));

    assert_eq!(node.accepted(), 1);
    let (ok, err) = match (a, b) {
        (Ok(receipt), Err(err)) | (Err(err), Ok(receipt)) => (receipt, err),
        other => panic!("expected exactly one success, got {other:?}"),
    };
    assert_eq!(ok.status, SubmissionStatus::Broadcast);
    assert_eq!(err.rejection_reason(), Some(RejectionReason::NonceConflict));
}
