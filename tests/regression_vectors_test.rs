//! Fixed vectors that pin the derivation scheme
//!
//! Server seed `abcdefghijklmnopqrstuvwxyz012345`, client seed `player1`.
//! Any change to the message format, cursor layout or game mappings breaks
//! these and invalidates every previously published round.

use fairroll::{
    extractor::{combine, leading_word, sha256_hex},
    games::{dice, keno, GameType},
    verify_commitment, CoinSide, GameParams, GameResult, OutcomeEngine,
};

const SERVER: &str = "abcdefghijklmnopqrstuvwxyz012345";
const CLIENT: &str = "player1";
const SERVER_HASH: &str = "653bb1245e828fcda4fa53fcd5a3def5bd7654e651f54b4132b73d74e64435c4";

#[test]
fn test_commitment_vector() {
    assert_eq!(sha256_hex(SERVER.as_bytes()), SERVER_HASH);
    assert!(verify_commitment(SERVER, SERVER_HASH));
}

#[test]
fn test_dice_vector() {
    let outcome = OutcomeEngine::default()
        .derive(SERVER, CLIENT, 0, &GameParams::Dice { target: 50 })
        .unwrap();

    assert_eq!(outcome.result, GameResult::Dice { roll: 90 });
    assert_eq!(outcome.raw_value, 196_159_390);
    assert_eq!(outcome.multiplier, 1.96);
    assert!(outcome.is_win);
    assert_eq!(outcome.cursor, 0);
    assert_eq!(outcome.server_seed_hash, SERVER_HASH);
}

#[test]
fn test_coinflip_reads_its_own_cursor() {
    let engine = OutcomeEngine::default();
    let dice = engine
        .derive(SERVER, CLIENT, 0, &GameParams::Dice { target: 50 })
        .unwrap();
    let coin = engine
        .derive(SERVER, CLIENT, 0, &GameParams::CoinFlip { choice: CoinSide::Heads })
        .unwrap();

    assert_eq!(coin.cursor, GameType::CoinFlip.base_cursor());
    assert_eq!(coin.cursor, 1 << 24);
    assert_eq!(coin.raw_value % 100, 29);
    assert_eq!(coin.result, GameResult::CoinFlip { side: CoinSide::Heads });
    assert_ne!(coin.combined_digest, dice.combined_digest);

    // Recombining at cursor 0 gives back the dice digest exactly
    let digest = combine(SERVER, CLIENT, 0, 0);
    assert_eq!(hex::encode(digest), dice.combined_digest);
    assert_eq!(leading_word(&digest), dice.raw_value);
}

#[test]
fn test_sequences_across_nonces() {
    let engine = OutcomeEngine::default();
    let heads = GameParams::CoinFlip { choice: CoinSide::Heads };

    let coins: Vec<u32> = (0..3)
        .map(|n| engine.derive(SERVER, CLIENT, n, &heads).unwrap().raw_value % 100)
        .collect();
    assert_eq!(coins, vec![29, 64, 97]);

    let crashes: Vec<GameResult> = (0..3)
        .map(|n| {
            engine
                .derive(SERVER, CLIENT, n, &GameParams::Crash { cashout: 1.01 })
                .unwrap()
                .result
        })
        .collect();
    assert_eq!(
        crashes,
        vec![
            GameResult::Crash { crash_point: 77.85 },
            GameResult::Crash { crash_point: 100.0 },
            GameResult::Crash { crash_point: 88.25 },
        ]
    );
}

#[test]
fn test_keno_vectors() {
    let engine = OutcomeEngine::default();
    let expected = [
        vec![35, 14, 16, 39, 10, 1, 26, 34, 8, 7],
        vec![5, 14, 26, 31, 7, 19, 3, 39, 23, 10],
        vec![34, 18, 38, 15, 21, 17, 2, 22, 13, 27],
    ];
    for (nonce, draws) in expected.iter().enumerate() {
        let outcome = engine
            .derive(SERVER, CLIENT, nonce as u64, &GameParams::Keno { picks: vec![14] })
            .unwrap();
        assert_eq!(outcome.result, GameResult::Keno { draws: draws.clone() });
        assert_eq!(outcome.is_win, draws.contains(&14));
    }
}

#[test]
fn test_keno_paytable() {
    let table: Vec<f64> = (1..=5).map(|k| keno::multiplier(k, 0.02)).collect();
    assert_eq!(table, vec![3.92, 16.9866, 80.6866, 426.4866, 2558.92]);
}

#[test]
fn test_crash_payout_is_exact() {
    let outcome = OutcomeEngine::default()
        .derive(SERVER, CLIENT, 0, &GameParams::Crash { cashout: 1.15 })
        .unwrap();
    assert!(outcome.is_win);
    assert_eq!(outcome.payout(100), 115);
}

#[test]
fn test_paytable_payouts_at_ten_thousand() {
    let engine = OutcomeEngine::default();
    let mut multipliers: Vec<f64> = (0..=99u8).map(|t| dice::multiplier(t, 0.02)).collect();
    multipliers.extend((1..=5).map(|k| keno::multiplier(k, 0.02)));
    multipliers.push(fairroll::games::coinflip::multiplier(0.03));

    for m in multipliers {
        let mut outcome = engine
            .derive(SERVER, CLIENT, 0, &GameParams::Dice { target: 50 })
            .unwrap();
        outcome.multiplier = m;
        let payout = outcome.payout(10_000);
        // Four-decimal multipliers pay exactly m * 10_000 minor units
        assert_eq!(payout as f64 / 10_000.0, m, "multiplier {}", m);
    }
}
