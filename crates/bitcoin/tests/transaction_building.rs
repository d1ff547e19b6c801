//! End-to-end builder scenarios: funding, payment, change, fee policy,
//! ordering, signing, and the checked-serialization ladder.

use rand::{rngs::StdRng, SeedableRng};
use txforge_bitcoin::{
    error::TransactionError,
    input::Input,
    keys::{Privkey, Pubkey},
    policy::{SerializeOpts, DEFAULT_RBF_SEQUENCE, DUST_AMOUNT, MAX_SAFE_SATOSHIS},
    transaction::{LockTime, Transaction},
    types::{
        script::{Script, ScriptPubkey},
        txin::{BitcoinOutpoint, BitcoinTxIn},
        txout::TxOut,
        utxo::Utxo,
    },
};
use txforge_core::{
    hashes::{hash160, sha256},
    ser::ByteFormat,
};
use txforge_bitcoin::hashes::TXID;

const COIN: u64 = 100_000_000;

fn key(n: u8) -> Privkey {
    Privkey::from_slice(&[n; 32]).unwrap()
}

fn txid(byte: u8) -> TXID {
    TXID::from([byte; 32])
}

fn p2pkh_utxo(signer: &Privkey, value: u64, txid_byte: u8, idx: u32) -> Utxo {
    Utxo::new(
        BitcoinOutpoint::new(txid(txid_byte), idx),
        value,
        ScriptPubkey::p2pkh(&signer.pubkey().hash160()),
    )
}

fn sorted_pubkeys(keys: &[Privkey]) -> Vec<Pubkey> {
    let mut pubkeys: Vec<Pubkey> = keys.iter().map(|k| k.pubkey()).collect();
    pubkeys.sort_by_key(|k| k.to_array());
    pubkeys
}

fn skip_signing() -> SerializeOpts {
    SerializeOpts {
        disable_is_fully_signed: true,
        ..Default::default()
    }
}

#[test]
fn it_deduplicates_funding_outputs() {
    let signer = key(1);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 10_000, 0xab, 0)).unwrap();
    tx.spend(p2pkh_utxo(&signer, 10_000, 0xab, 0)).unwrap();
    assert_eq!(tx.inputs().len(), 1);
    assert_eq!(tx.input_amount().unwrap(), 10_000);
}

#[test]
fn it_sorts_inputs_and_outputs_per_bip69() {
    let signer = key(1);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 1_000, 0x01, 0))
        .unwrap()
        .spend(p2pkh_utxo(&signer, 1_000, 0x00, 1))
        .unwrap()
        .spend(p2pkh_utxo(&signer, 1_000, 0x00, 0))
        .unwrap();
    tx.add_output(TxOut::new(2_000, ScriptPubkey::p2pkh(&[0xbb; 20])));
    tx.add_output(TxOut::new(1_000, ScriptPubkey::p2pkh(&[0xaa; 20])));
    tx.add_output(TxOut::new(1_000, ScriptPubkey::p2pkh(&[0x0a; 20])));

    tx.sort().unwrap();

    let outpoints: Vec<(u8, u32)> = tx
        .inputs()
        .iter()
        .map(|i| (i.outpoint().txid.0[0], i.outpoint().idx))
        .collect();
    assert_eq!(outpoints, vec![(0x00, 0), (0x00, 1), (0x01, 0)]);

    let amounts: Vec<u64> = tx.outputs().iter().map(|o| o.value).collect();
    assert_eq!(amounts, vec![1_000, 1_000, 2_000]);
    // equal amounts tie-broken by script bytes
    assert_eq!(tx.outputs()[0].script_pubkey.items()[3], 0x0a);
}

#[test]
fn it_rejects_dust_outputs_but_exempts_data_outputs() {
    let signer = key(1);

    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(DUST_AMOUNT - 1, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    match tx.checked_serialize(&skip_signing()) {
        Err(TransactionError::DustOutputs) => {}
        other => panic!("expected DustOutputs, got {:?}", other),
    }

    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100_000, 0x01, 0)).unwrap();
    tx.add_data(b"tiny");
    let opts = SerializeOpts {
        disable_is_fully_signed: true,
        disable_large_fees: true,
        ..Default::default()
    };
    assert!(tx.checked_serialize(&opts).is_ok());
}

#[test]
fn it_signals_rbf_only_for_final_sequences() {
    let signer = key(1);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 10_000, 0x01, 0))
        .unwrap()
        .spend(p2pkh_utxo(&signer, 10_000, 0x02, 0))
        .unwrap();
    tx.input_mut(1).unwrap().set_sequence(0x0000_0000);

    assert!(tx.is_rbf()); // the customized input already signals

    tx.enable_rbf();
    assert_eq!(tx.inputs()[0].sequence(), DEFAULT_RBF_SEQUENCE);
    assert_eq!(tx.inputs()[1].sequence(), 0x0000_0000);
    assert!(tx.is_rbf());

    let mut quiet = Transaction::new();
    quiet.spend(p2pkh_utxo(&signer, 10_000, 0x03, 0)).unwrap();
    assert!(!quiet.is_rbf());
}

#[test]
fn it_computes_fee_as_unspent_value_without_change() {
    let signer = key(1);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100 * COIN, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(COIN, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    assert_eq!(tx.get_fee().unwrap(), 99 * COIN);
}

#[test]
fn it_enforces_locktime_ranges() {
    let signer = key(1);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 10_000, 0x01, 0)).unwrap();

    match tx.lock_until_block_height(-1) {
        Err(TransactionError::NegativeLockTime(-1)) => {}
        other => panic!("expected NegativeLockTime, got {:?}", other),
    }
    match tx.lock_until_block_height(500_000_000) {
        Err(TransactionError::BlockHeightTooHigh(_)) => {}
        other => panic!("expected BlockHeightTooHigh, got {:?}", other),
    }
    match tx.lock_until_date(499_999_999) {
        Err(TransactionError::LockTimeTooEarly(_)) => {}
        other => panic!("expected LockTimeTooEarly, got {:?}", other),
    }

    tx.lock_until_block_height(650_000).unwrap();
    assert_eq!(tx.lock_time(), Some(LockTime::Height(650_000)));
    // a maximal sequence would disable the locktime
    assert_eq!(tx.inputs()[0].sequence(), 0xffff_fffe);

    tx.lock_until_date(1_600_000_000).unwrap();
    assert_eq!(tx.lock_time(), Some(LockTime::Timestamp(1_600_000_000)));
}

#[test]
fn it_materializes_change_once_per_signing_pass() {
    let signer = key(1);
    let change_script = ScriptPubkey::p2pkh(&signer.pubkey().hash160());

    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 1_000_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(200_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .change_script_pubkey(change_script.clone());

    // change is not materialized until a signing pass
    assert_eq!(tx.outputs().len(), 1);
    assert_eq!(tx.change_index(), None);

    tx.sign(&signer).unwrap();
    assert_eq!(tx.outputs().len(), 2);
    let change_index = tx.change_index().unwrap();
    let first_outputs = tx.outputs().to_vec();
    assert_eq!(tx.get_change_output().unwrap().script_pubkey, change_script);
    assert!(tx.is_fully_signed().unwrap());

    // a second signing pass with no intervening mutation leaves the output
    // list untouched
    tx.sign(&signer).unwrap();
    assert_eq!(tx.outputs(), &first_outputs[..]);
    assert_eq!(tx.change_index(), Some(change_index));
    assert!(tx.is_fully_signed().unwrap());

    assert!(tx.serialize().is_ok());
}

#[test]
fn it_absorbs_dust_change_into_the_fee() {
    let signer = key(1);
    let mut tx = Transaction::new();
    // estimated fee leaves less than the dust threshold as change
    tx.spend(p2pkh_utxo(&signer, 30_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(7_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .change_script_pubkey(ScriptPubkey::p2pkh(&[0xcc; 20]));
    tx.sign(&signer).unwrap();
    assert_eq!(tx.outputs().len(), 1);
    assert_eq!(tx.change_index(), None);
}

#[test]
fn it_tracks_change_through_shuffles() {
    let signer = key(1);
    let change_script = ScriptPubkey::p2pkh(&[0xcc; 20]);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 1_000_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(100_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .pay_script_pubkey(150_000, ScriptPubkey::p2pkh(&[0xbb; 20]))
        .unwrap()
        .change_script_pubkey(change_script.clone());
    tx.sign(&signer).unwrap();
    assert_eq!(tx.outputs().len(), 3);

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..5 {
        tx.shuffle_outputs(&mut rng).unwrap();
        let change = &tx.outputs()[tx.change_index().unwrap()];
        assert_eq!(change.script_pubkey, change_script);
    }

    // shuffling without a change output must not fail
    let mut no_change = Transaction::new();
    no_change
        .spend(p2pkh_utxo(&signer, 10_000, 0x02, 0))
        .unwrap()
        .pay_script_pubkey(9_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    no_change.shuffle_outputs(&mut rng).unwrap();
}

#[test]
fn it_rejects_sortings_that_are_not_permutations() {
    let signer = key(1);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(10_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .pay_script_pubkey(20_000, ScriptPubkey::p2pkh(&[0xbb; 20]))
        .unwrap();

    match tx.sort_outputs(|outputs| vec![outputs[0].clone()]) {
        Err(TransactionError::InvalidSorting) => {}
        other => panic!("expected InvalidSorting, got {:?}", other),
    }
    match tx.sort_outputs(|outputs| vec![outputs[0].clone(), outputs[0].clone()]) {
        Err(TransactionError::InvalidSorting) => {}
        other => panic!("expected InvalidSorting, got {:?}", other),
    }
    // an honest permutation is accepted
    tx.sort_outputs(|outputs| vec![outputs[1].clone(), outputs[0].clone()])
        .unwrap();
    assert_eq!(tx.outputs()[0].value, 20_000);
}

#[test]
fn it_runs_the_fee_validation_ladder() {
    let signer = key(1);

    // unsigned with default opts
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(80_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    match tx.serialize() {
        Err(TransactionError::MissingSignatures) => {}
        other => panic!("expected MissingSignatures, got {:?}", other),
    }

    // spending more than the inputs provide
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 10_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(20_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    match tx.checked_serialize(&skip_signing()) {
        Err(TransactionError::InvalidOutputAmountSum { inputs: 10_000, outputs: 20_000 }) => {}
        other => panic!("expected InvalidOutputAmountSum, got {:?}", other),
    }

    // a huge implied fee with no change address to blame
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100 * COIN, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(1_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    match tx.checked_serialize(&skip_signing()) {
        Err(TransactionError::ChangeAddressMissing) => {}
        other => panic!("expected ChangeAddressMissing, got {:?}", other),
    }

    // the same fee with a change address is just too large
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100 * COIN, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(1_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .change_script_pubkey(ScriptPubkey::p2pkh(&[0xcc; 20]));
    match tx.checked_serialize(&skip_signing()) {
        Err(TransactionError::FeeTooLarge { .. }) => {}
        other => panic!("expected FeeTooLarge, got {:?}", other),
    }

    // a zero fee is too small
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 10_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(10_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    match tx.checked_serialize(&skip_signing()) {
        Err(TransactionError::FeeTooSmall { .. }) => {}
        other => panic!("expected FeeTooSmall, got {:?}", other),
    }

    // the declared fee must match the implied fee
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(50_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    tx.fee(10_000);
    match tx.checked_serialize(&skip_signing()) {
        Err(TransactionError::FeeDifferentThanDeclared { declared: 10_000, unspent: 50_000 }) => {}
        other => panic!("expected FeeDifferentThanDeclared, got {:?}", other),
    }

    // amounts beyond the representable bound are corrupt
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 100_000, 0x01, 0)).unwrap();
    tx.add_output(TxOut::new(
        MAX_SAFE_SATOSHIS + 1,
        ScriptPubkey::p2pkh(&[0xaa; 20]),
    ));
    match tx.checked_serialize(&SerializeOpts::default()) {
        Err(TransactionError::InvalidSatoshis(_)) => {}
        other => panic!("expected InvalidSatoshis, got {:?}", other),
    }
}

#[test]
fn it_signs_p2pkh_end_to_end() {
    let signer = key(7);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 1_000_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(950_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .sign(&signer)
        .unwrap();

    assert!(tx.is_fully_signed().unwrap());
    let script_sig = tx.inputs()[0].script_sig();
    // <sig+hashtype> <pubkey>
    assert!(!script_sig.is_empty());
    assert_eq!(script_sig.items()[script_sig.len() - 34], 33);

    // a wrong key signs nothing
    let mut unsigned = Transaction::new();
    unsigned
        .spend(p2pkh_utxo(&signer, 1_000_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(950_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .sign(&key(8))
        .unwrap();
    assert!(!unsigned.is_fully_signed().unwrap());
}

#[test]
fn it_signs_witness_and_nested_pubkey_hash_inputs() {
    let signer = key(9);
    let pkh = signer.pubkey().hash160();

    // native P2WPKH
    let mut tx = Transaction::new();
    let wpkh_utxo = Utxo::new(
        BitcoinOutpoint::new(txid(0x05), 0),
        500_000,
        ScriptPubkey::p2wpkh(&pkh),
    );
    tx.spend(wpkh_utxo)
        .unwrap()
        .pay_script_pubkey(450_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .sign(&signer)
        .unwrap();
    assert!(tx.is_fully_signed().unwrap());
    assert!(tx.has_witnesses());
    assert!(tx.inputs()[0].script_sig().is_empty());
    assert_eq!(tx.inputs()[0].witness().len(), 2);

    // witness data is excluded from the txid
    let stripped = Transaction::deserialize_hex(&hex::encode(tx.to_bytes(true))).unwrap();
    assert_eq!(stripped.txid(), tx.txid());
    assert_ne!(tx.txid().0, tx.wtxid().0);

    // P2WPKH nested in P2SH
    let program = ScriptPubkey::p2wpkh(&pkh);
    let mut nested = Transaction::new();
    let nested_utxo = Utxo::new(
        BitcoinOutpoint::new(txid(0x06), 0),
        500_000,
        ScriptPubkey::p2sh(&hash160(program.items())),
    );
    nested
        .spend(nested_utxo)
        .unwrap()
        .pay_script_pubkey(450_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .sign(&signer)
        .unwrap();
    assert!(nested.is_fully_signed().unwrap());
    // the scriptSig carries only the witness program push
    assert_eq!(nested.inputs()[0].script_sig().len(), 23);
    assert_eq!(nested.inputs()[0].witness().len(), 2);

    // full wire round trip stays byte-exact
    let raw = nested.serialize_hex();
    let reparsed = Transaction::deserialize_hex(&raw).unwrap();
    assert_eq!(reparsed.serialize_hex(), raw);
}

#[test]
fn it_signs_bare_p2pk_inputs() {
    let signer = key(4);
    let utxo = Utxo::new(
        BitcoinOutpoint::new(txid(0x07), 0),
        100_000,
        ScriptPubkey::p2pk(&signer.pubkey().to_array()),
    );
    let mut tx = Transaction::new();
    tx.spend(utxo)
        .unwrap()
        .pay_script_pubkey(90_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .sign(&signer)
        .unwrap();
    assert!(tx.is_fully_signed().unwrap());
    assert!(!tx.inputs()[0].script_sig().is_empty());
    assert!(!tx.has_witnesses());
}

#[test]
fn it_accumulates_multisig_signatures_up_to_the_threshold() {
    let keys: Vec<Privkey> = vec![key(1), key(2), key(3)];
    let pubkeys = sorted_pubkeys(&keys);
    let key_arrays: Vec<[u8; 33]> = pubkeys.iter().map(|k| k.to_array()).collect();
    let redeem = Script::multisig(2, &key_arrays);

    // legacy P2SH 2-of-3
    let utxo = Utxo::new(
        BitcoinOutpoint::new(txid(0x08), 0),
        1_000_000,
        ScriptPubkey::p2sh(&hash160(redeem.items())),
    );
    let mut tx = Transaction::new();
    tx.spend_multisig(utxo, pubkeys.clone(), 2)
        .unwrap()
        .pay_script_pubkey(950_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();

    tx.sign(&keys[0]).unwrap();
    let multisig = tx.inputs()[0].as_multisig().unwrap();
    assert_eq!(multisig.count_signatures(), 1);
    assert_eq!(multisig.count_missing_signatures(), 1);
    assert!(!tx.is_fully_signed().unwrap());

    tx.sign(&keys[1]).unwrap();
    let multisig = tx.inputs()[0].as_multisig().unwrap();
    assert_eq!(multisig.count_signatures(), 2);
    assert!(tx.is_fully_signed().unwrap());
    assert_eq!(multisig.pubkeys_without_signature().len(), 1);

    // OP_0 prefix for the CHECKMULTISIG off-by-one
    assert_eq!(tx.inputs()[0].script_sig().items()[0], 0x00);

    // a key outside the set contributes nothing
    let mut stranger = Transaction::new();
    let utxo = Utxo::new(
        BitcoinOutpoint::new(txid(0x09), 0),
        1_000_000,
        ScriptPubkey::p2sh(&hash160(redeem.items())),
    );
    stranger
        .spend_multisig(utxo, pubkeys.clone(), 2)
        .unwrap()
        .pay_script_pubkey(950_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .sign(&key(15))
        .unwrap();
    assert_eq!(
        stranger.inputs()[0].as_multisig().unwrap().count_signatures(),
        0
    );
}

#[test]
fn it_signs_witness_multisig_inputs() {
    let keys: Vec<Privkey> = vec![key(11), key(12), key(13)];
    let pubkeys = sorted_pubkeys(&keys);
    let key_arrays: Vec<[u8; 33]> = pubkeys.iter().map(|k| k.to_array()).collect();
    let redeem = Script::multisig(2, &key_arrays);

    let utxo = Utxo::new(
        BitcoinOutpoint::new(txid(0x0a), 0),
        2_000_000,
        ScriptPubkey::p2wsh(&sha256(redeem.items())),
    );
    let mut tx = Transaction::new();
    tx.spend_multisig(utxo, pubkeys, 2)
        .unwrap()
        .pay_script_pubkey(1_900_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap()
        .sign(&keys[0])
        .unwrap()
        .sign(&keys[2])
        .unwrap();

    assert!(tx.is_fully_signed().unwrap());
    assert!(tx.inputs()[0].script_sig().is_empty());
    // empty slot + two signatures + witness script
    assert_eq!(tx.inputs()[0].witness().len(), 4);
    assert!(tx.inputs()[0].witness()[0].is_empty());

    let raw = tx.serialize_hex();
    let reparsed = Transaction::deserialize_hex(&raw).unwrap();
    assert_eq!(reparsed.serialize_hex(), raw);
}

#[test]
fn it_validates_and_applies_detached_signatures() {
    let signer = key(5);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 500_000, 0x01, 0))
        .unwrap()
        .pay_script_pubkey(490_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();

    let signatures = tx
        .get_signatures(&signer, txforge_bitcoin::sighash::Sighash::All)
        .unwrap();
    assert_eq!(signatures.len(), 1);
    assert!(tx.is_valid_signature(&signatures[0]).unwrap());

    tx.apply_signature(signatures[0].clone()).unwrap();
    assert!(tx.is_fully_signed().unwrap());
}

#[test]
fn it_requires_utxo_info_to_add_or_sign() {
    let raw_input = Input::from_wire(BitcoinTxIn::new(
        BitcoinOutpoint::new(txid(0x01), 0),
        vec![],
        0xffff_ffff,
    ));

    let mut tx = Transaction::new();
    match tx.add_input(raw_input.clone()) {
        Err(TransactionError::NeedMoreInfo(_)) => {}
        other => panic!("expected NeedMoreInfo, got {:?}", other),
    }

    tx.unchecked_add_input(raw_input);
    match tx.sign(&key(1)) {
        Err(TransactionError::NeedMoreInfo(_)) => {}
        other => panic!("expected NeedMoreInfo, got {:?}", other),
    }
    match tx.is_fully_signed() {
        Err(TransactionError::UnableToVerifySignature) => {}
        other => panic!("expected UnableToVerifySignature, got {:?}", other),
    }
}

#[test]
fn it_removes_inputs_and_outputs_by_index_and_outpoint() {
    let signer = key(1);
    let mut tx = Transaction::new();
    tx.spend(p2pkh_utxo(&signer, 10_000, 0x01, 0))
        .unwrap()
        .spend(p2pkh_utxo(&signer, 20_000, 0x02, 5))
        .unwrap();
    assert_eq!(tx.input_amount().unwrap(), 30_000);

    match tx.remove_input(7) {
        Err(TransactionError::InvalidIndex { index: 7, length: 2 }) => {}
        other => panic!("expected InvalidIndex, got {:?}", other),
    }

    tx.remove_input_outpoint(&txid(0x02), 5).unwrap();
    assert_eq!(tx.inputs().len(), 1);
    assert_eq!(tx.input_amount().unwrap(), 10_000);

    tx.pay_script_pubkey(1_000, ScriptPubkey::p2pkh(&[0xaa; 20]))
        .unwrap();
    tx.remove_output(0).unwrap();
    assert_eq!(tx.output_amount(), 0);
    match tx.remove_output(0) {
        Err(TransactionError::InvalidIndex { .. }) => {}
        other => panic!("expected InvalidIndex, got {:?}", other),
    }
}

#[test]
fn it_handles_coinbase_transactions() {
    let mut tx = Transaction::new();
    tx.unchecked_add_input(Input::from_wire(BitcoinTxIn::new(
        BitcoinOutpoint::null(),
        vec![0x51, 0x51, 0x51],
        0xffff_ffff,
    )));
    tx.add_output(TxOut::new(50 * COIN, ScriptPubkey::p2pkh(&[0xaa; 20])));

    assert!(tx.is_coinbase());
    assert_eq!(tx.get_fee().unwrap(), 0);
    assert_eq!(tx.verify(), Ok(()));

    // an oversized coinbase script is rejected
    let mut bad = Transaction::new();
    bad.unchecked_add_input(Input::from_wire(BitcoinTxIn::new(
        BitcoinOutpoint::null(),
        vec![0x00; 101],
        0xffff_ffff,
    )));
    bad.add_output(TxOut::new(50 * COIN, ScriptPubkey::p2pkh(&[0xaa; 20])));
    assert_eq!(
        bad.verify(),
        Err("coinbase transaction script size invalid".to_owned())
    );
}

#[test]
fn it_reports_structural_problems_from_verify() {
    let signer = key(1);

    let empty = Transaction::new();
    assert_eq!(empty.verify(), Err("transaction txins empty".to_owned()));

    let mut dup = Transaction::new();
    let outpoint = BitcoinOutpoint::new(txid(0x01), 0);
    dup.unchecked_add_input(Input::from_wire(BitcoinTxIn::new(outpoint, vec![], 0)));
    dup.unchecked_add_input(Input::from_wire(BitcoinTxIn::new(outpoint, vec![], 0)));
    dup.add_output(TxOut::new(1_000, ScriptPubkey::p2pkh(&[0xaa; 20])));
    assert_eq!(
        dup.verify(),
        Err("transaction input 1 duplicate input".to_owned())
    );

    let mut null_input = Transaction::new();
    null_input.spend(p2pkh_utxo(&signer, 10_000, 0x01, 0)).unwrap();
    null_input.unchecked_add_input(Input::from_wire(BitcoinTxIn::new(
        BitcoinOutpoint::null(),
        vec![],
        0,
    )));
    null_input.add_output(TxOut::new(1_000, ScriptPubkey::p2pkh(&[0xaa; 20])));
    assert_eq!(
        null_input.verify(),
        Err("transaction input 1 has null input".to_owned())
    );
}

#[test]
fn it_rejects_invalid_payment_amounts() {
    let mut tx = Transaction::new();
    match tx.pay_script_pubkey(0, ScriptPubkey::p2pkh(&[0xaa; 20])) {
        Err(TransactionError::InvalidAmount(0)) => {}
        other => panic!("expected InvalidAmount, got {:?}", other),
    }
}
