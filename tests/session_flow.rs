use rand::{rngs::StdRng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tokenloyalty::{
    export::{export_session, MemorySink, StateExport},
    ledger::replay_balances,
    Command, EntryKind, LoyaltyError, Network, Outcome, ProgramDraft, ProgramId, Session,
};

fn deli() -> ProgramDraft {
    ProgramDraft {
        name: "Corner Deli".into(),
        token_symbol: "deli".into(),
        fixed_cents_per_point: 0,
        earn_rate_pct: dec!(10),
        breakage_pct: dec!(25),
    }
}

#[test]
fn demo_walkthrough_survives_export_and_import() {
    let mut session = Session::with_rng(StdRng::seed_from_u64(2024));

    let deli = match session.apply_at(Command::CreateProgram(deli()), 1).unwrap() {
        Outcome::ProgramCreated(p) => p,
        other => panic!("unexpected outcome {other:?}"),
    };
    // cents-per-point of 0 is clamped so conversions never divide by zero
    assert_eq!(deli.fixed_cents_per_point, 1);
    assert_eq!(deli.token_symbol, "DELI");
    assert_eq!(session.registry().list()[0].id, deli.id);

    let rejected = session.apply_at(
        Command::Issue {
            program: None,
            purchase_amount: dec!(12.34),
        },
        2,
    );
    assert_eq!(rejected, Err(LoyaltyError::WalletNotConnected));

    session
        .apply_at(Command::ConnectWallet(Network::Solana), 3)
        .unwrap();
    // 10% of $12.34 = $1.234 value, at 100 pts/$ = 123.4 pts
    session
        .apply_at(
            Command::Issue {
                program: None,
                purchase_amount: dec!(12.34),
            },
            4,
        )
        .unwrap();
    assert_eq!(session.ledger().balance(&deli.id), dec!(123.40));

    session
        .apply_at(
            Command::Issue {
                program: Some(ProgramId::new("seed-jet")),
                purchase_amount: dec!(500),
            },
            5,
        )
        .unwrap();
    session
        .apply_at(
            Command::Redeem {
                program: None,
                points: dec!(23.4),
            },
            6,
        )
        .unwrap();

    let too_much = session.apply_at(
        Command::Redeem {
            program: None,
            points: dec!(100.01),
        },
        7,
    );
    assert!(matches!(
        too_much,
        Err(LoyaltyError::InsufficientBalance { available, .. }) if available == dec!(100)
    ));

    let latest = session.ledger().entries().next().unwrap();
    assert_eq!(latest.kind, EntryKind::Redeem);
    assert_eq!(latest.value_amount, dec!(0.234));

    let mut sink = MemorySink::default();
    let name = export_session(&session, &mut sink, 99).unwrap();
    assert_eq!(name, "tokenloyalty-demo-99.json");

    let doc = StateExport::from_json_slice(&sink.files[0].1).unwrap();
    assert_eq!(doc.ledger.len(), 3);
    assert_eq!(doc.selected_program_id.as_ref(), Some(&deli.id));
    assert_eq!(replay_balances(doc.ledger.iter().rev()).unwrap(), doc.balances);

    let restored = doc.into_session(StdRng::seed_from_u64(1));
    assert_eq!(restored.ledger().balance(&deli.id), dec!(100));
    assert_eq!(
        restored.ledger().balance(&ProgramId::new("seed-jet")),
        dec!(1000)
    );
    assert_eq!(restored.registry().selected_id(), Some(&deli.id));
}

#[test]
fn reset_wipes_history_but_not_wallet() {
    let mut session = Session::with_rng(StdRng::seed_from_u64(3));
    session
        .apply_at(Command::ConnectWallet(Network::Evm), 1)
        .unwrap();
    session.apply_at(Command::CreateProgram(deli()), 2).unwrap();
    session
        .apply_at(
            Command::Issue {
                program: None,
                purchase_amount: dec!(1),
            },
            3,
        )
        .unwrap();

    session.apply_at(Command::Reset, 4).unwrap();

    let ids: Vec<&str> = session
        .registry()
        .list()
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, vec!["seed-brew", "seed-jet", "seed-fuel"]);
    assert_eq!(
        session.registry().selected_id(),
        Some(&ProgramId::new("seed-brew"))
    );
    assert!(session.ledger().is_empty());
    assert_eq!(
        session.ledger().balance(&ProgramId::new("seed-brew")),
        Decimal::ZERO
    );
    assert!(session.wallet().is_some());
}
