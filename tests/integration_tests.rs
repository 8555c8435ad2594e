//! End-to-end tests: pool directory to mined block artifact

mod common;

use block_miner::coinbase::verify_witness_commitment;
use block_miner::merkle::compute_merkle_root;
use block_miner::mining::check_proof_of_work;
use block_miner::selection::select;
use block_miner::serialization::{compute_txid, deserialize_transaction, serialize_header};
use block_miner::*;
use common::*;
use std::fs;
use std::path::Path;

/// fee 1000 / weight 500, fee 2000 / weight 800, and a record that is out of balance by one
fn write_scenario_pool(dir: &Path) {
    let first = create_spend(1, 10_000, true);
    let second = create_spend(2, 20_000, false);
    let imbalanced = create_spend(3, 4_000, true);

    write_entry(dir, "a.json", &create_entry(&first, &[11_000], 1000, 500));
    write_entry(dir, "b.json", &create_entry(&second, &[22_000], 2000, 800));
    write_entry(dir, "c.json", &create_entry(&imbalanced, &[5_000], 1001, 300));
}

fn scenario_config(dir: &Path) -> MinerConfig {
    MinerConfig {
        target: easy_target_hex(),
        max_fee: 2500,
        max_weight: 1500,
        reserved_weight: 0,
        mempool_dir: dir.to_path_buf(),
        output: dir.join("out.txt"),
        ..MinerConfig::default()
    }
}

#[test]
fn test_scenario_selection() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario_pool(dir.path());

    let pool = TransactionPool::load(dir.path()).unwrap();
    assert_eq!(
        pool.report(),
        LoadReport {
            loaded: 2,
            malformed: 0,
            rejected: 1,
        }
    );

    let state = select(pool.records(), 2500, 1500);
    assert_eq!(state.selected().len(), 1);
    assert_eq!(state.selected()[0].transaction, create_spend(1, 10_000, true));
    assert_eq!(state.fee(), 1000);
    assert_eq!(state.weight(), 500);
}

#[test]
fn test_scenario_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario_pool(dir.path());
    let config = scenario_config(dir.path());

    let pool = TransactionPool::load(&config.mempool_dir).unwrap();
    let miner = BlockMiner::from_config(&config).unwrap();
    let block = miner.mine_block(&pool, &CancelToken::new()).unwrap().unwrap();

    assert_eq!(block.transactions.len(), 2);
    let coinbase = block.coinbase();
    assert!(coinbase.is_coinbase());
    assert_eq!(coinbase.outputs[0].value, 1000);
    assert_eq!(coinbase.outputs[1].value, 0);
    assert_eq!(block.transactions[1], create_spend(1, 10_000, true));

    assert!(verify_witness_commitment(&block.transactions).unwrap());
    assert!(check_proof_of_work(&block.header).unwrap());
    assert_eq!(block.header.version, 4);
    assert_eq!(block.header.prev_block_hash, [0u8; 32]);
    assert_eq!(block.header.merkle_root, compute_merkle_root(&block.txids()).unwrap());
}

#[test]
fn test_scenario_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario_pool(dir.path());
    let config = scenario_config(dir.path());

    let pool = TransactionPool::load(&config.mempool_dir).unwrap();
    let block = BlockMiner::from_config(&config)
        .unwrap()
        .mine_block(&pool, &CancelToken::new())
        .unwrap()
        .unwrap();
    BlockArtifact::from_block(&block).write_to(&config.output).unwrap();

    let contents = fs::read_to_string(&config.output).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], hex::encode(serialize_header(&block.header)));

    let coinbase = deserialize_transaction(&hex::decode(lines[1]).unwrap()).unwrap();
    assert_eq!(&coinbase, block.coinbase());
    assert_eq!(lines[2], to_display_hex(&compute_txid(&coinbase)));
    assert_eq!(lines[3], to_display_hex(&compute_txid(&create_spend(1, 10_000, true))));
}

#[test]
fn test_reserved_weight_applies_to_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario_pool(dir.path());
    let config = MinerConfig {
        reserved_weight: 1000,
        ..scenario_config(dir.path())
    };

    let pool = TransactionPool::load(&config.mempool_dir).unwrap();
    let state = BlockMiner::from_config(&config).unwrap().select(&pool);
    // 1000 + 500 reaches the cap, 1000 + 800 exceeds it
    assert!(state.is_empty());
}

#[test]
fn test_parallel_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario_pool(dir.path());
    let config = MinerConfig {
        workers: 4,
        ..scenario_config(dir.path())
    };

    let pool = TransactionPool::load(&config.mempool_dir).unwrap();
    let block = BlockMiner::from_config(&config)
        .unwrap()
        .mine_block(&pool, &CancelToken::new())
        .unwrap()
        .unwrap();
    assert!(check_proof_of_work(&block.header).unwrap());
}

#[test]
fn test_malformed_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario_pool(dir.path());

    fs::write(dir.path().join("d.json"), "not json").unwrap();
    let mut bad_hex = create_entry(&create_spend(4, 100, false), &[200], 100, 200);
    bad_hex["hex"] = "0200zz".into();
    write_entry(dir.path(), "e.json", &bad_hex);
    let mut missing_fee = create_entry(&create_spend(5, 100, false), &[200], 100, 200);
    missing_fee.as_object_mut().unwrap().remove("fee");
    write_entry(dir.path(), "f.json", &missing_fee);
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let pool = TransactionPool::load(dir.path()).unwrap();
    assert_eq!(
        pool.report(),
        LoadReport {
            loaded: 2,
            malformed: 3,
            rejected: 1,
        }
    );
}

#[test]
fn test_declared_values_decide_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let tx = create_spend(6, 900, false);

    let mut off_by_one = create_entry(&tx, &[1000], 100, 400);
    off_by_one["vout"][0]["value"] = 901u64.into();
    write_entry(dir.path(), "a.json", &off_by_one);

    let mut rebalanced = create_entry(&tx, &[1000], 99, 400);
    rebalanced["vout"][0]["value"] = 901u64.into();
    write_entry(dir.path(), "b.json", &rebalanced);

    let pool = TransactionPool::load(dir.path()).unwrap();
    assert_eq!(
        pool.report(),
        LoadReport {
            loaded: 1,
            malformed: 0,
            rejected: 1,
        }
    );
    assert_eq!(pool.records()[0].fee, 99);
    assert_eq!(pool.records()[0].output_values, vec![901]);
}

#[test]
fn test_pool_order_follows_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let late = create_spend(9, 1000, false);
    let early = create_spend(8, 1000, false);
    write_entry(dir.path(), "z.json", &create_entry(&late, &[1100], 100, 400));
    write_entry(dir.path(), "m.json", &create_entry(&early, &[1100], 100, 400));

    let pool = TransactionPool::load(dir.path()).unwrap();
    assert_eq!(pool.records()[0].transaction, early);
    assert_eq!(pool.records()[1].transaction, late);
}

#[test]
fn test_missing_pool_directory() {
    let result = TransactionPool::load("/nonexistent/mempool");
    assert!(matches!(result, Err(MinerError::Io(_))));
}

#[test]
fn test_exhaustion_without_retry_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = MinerConfig {
        target: "01".to_string(),
        retry: RetryStrategy::Fail,
        mempool_dir: dir.path().to_path_buf(),
        ..MinerConfig::default()
    };

    let miner = BlockMiner::from_config(&config)
        .unwrap()
        .with_miner(Miner::new(1, RetryStrategy::Fail).with_nonce_limit(1000));
    let result = miner.mine_block(&TransactionPool::default(), &CancelToken::new());
    assert!(matches!(result, Err(MinerError::NonceSpaceExhausted { attempts: 1000 })));
}
