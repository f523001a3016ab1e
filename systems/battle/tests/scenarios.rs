use cavern_skirmish_core::{BattleConfig, Faction};
use cavern_skirmish_system_battle::{Battle, BattleState};
use cavern_skirmish_world::{query, CavernMap};

const OPENING: &str = "\
#######
#.G...#
#...EG#
#.#.#G#
#..G#E#
#.....#
#######
";

fn run(map: &str) -> (Battle, cavern_skirmish_system_battle::BattleOutcome) {
    let map = CavernMap::parse(map).expect("valid map");
    let mut battle = Battle::new(&map, &BattleConfig::default());
    let outcome = battle.run_simulation();
    (battle, outcome)
}

fn assert_outcome(map: &str, rounds: u32, remaining: u64, winner: Faction) {
    let (battle, outcome) = run(map);

    assert_eq!(battle.state(), BattleState::Ended);
    assert_eq!(outcome.rounds, rounds, "rounds for\n{map}");
    assert_eq!(outcome.remaining_health, remaining, "hit points for\n{map}");
    assert_eq!(outcome.score, u64::from(rounds) * remaining);
    assert_eq!(outcome.winner, Some(winner));
    assert_eq!(battle.score(), outcome.score);
}

#[test]
fn opening_battle_matches_reference_result() {
    // Published figures for this map: 47 full rounds, 590 hit points, 27730.
    assert_outcome(OPENING, 47, 590, Faction::Goblin);
}

#[test]
fn opening_battle_leaves_expected_survivors() {
    let (battle, _) = run(OPENING);

    assert_eq!(
        query::render(battle.world()),
        "\
#######
#G....#   G(200)
#.G...#   G(131)
#.#.#G#   G(59)
#...#.#
#....G#   G(200)
#######
"
    );
}

#[test]
fn elves_sweep_scattered_goblins() {
    assert_outcome(
        "\
#######
#G..#E#
#E#E.E#
#G.##.#
#...#E#
#...E.#
#######
",
        37,
        982,
        Faction::Elf,
    );
}

#[test]
fn elves_hold_the_corridor() {
    assert_outcome(
        "\
#######
#E..EG#
#.#G.E#
#E.##E#
#G..#.#
#..E#.#
#######
",
        46,
        859,
        Faction::Elf,
    );
}

#[test]
fn goblins_overrun_split_cavern() {
    assert_outcome(
        "\
#######
#E.G#.#
#.#G..#
#G.#.G#
#G..#.#
#...E.#
#######
",
        35,
        793,
        Faction::Goblin,
    );
}

#[test]
fn goblins_win_the_long_siege() {
    assert_outcome(
        "\
#######
#.E...#
#.#..G#
#.###.#
#E#G#G#
#...#G#
#######
",
        54,
        536,
        Faction::Goblin,
    );
}

#[test]
fn goblins_win_the_open_field() {
    assert_outcome(
        "\
#########
#G......#
#.E.#...#
#..##..G#
#...##..#
#...#...#
#.G...G.#
#.....G.#
#########
",
        20,
        937,
        Faction::Goblin,
    );
}

#[test]
fn one_faction_map_scores_zero() {
    let (battle, outcome) = run("#####\n#G.G#\n#G..#\n#####\n");

    assert_eq!(battle.completed_rounds(), 0);
    assert_eq!(outcome.rounds, 0);
    assert_eq!(outcome.remaining_health, 600);
    assert_eq!(outcome.score, 0);
}

#[test]
fn map_without_units_ends_at_once() {
    let (battle, outcome) = run("#####\n#...#\n#####\n");

    assert_eq!(battle.state(), BattleState::Ended);
    assert_eq!(outcome.rounds, 0);
    assert_eq!(outcome.remaining_health, 0);
    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.winner, None);
}

#[test]
fn sealed_off_factions_keep_completing_rounds() {
    // Neither side can reach the other, so every round completes until the
    // loop below gives up; the battle itself would never end.
    let map = CavernMap::parse("#######\n#E.#.G#\n#######\n").expect("valid map");
    let mut battle = Battle::new(&map, &BattleConfig::default());

    for _ in 0..10 {
        assert!(battle.process_turn());
    }
    assert_eq!(query::remaining_health(battle.world()), 400);
    assert!(query::occupancy_consistent(battle.world()));
}

#[test]
fn stronger_elves_change_the_opening_battle() {
    let map = CavernMap::parse(OPENING).expect("valid map");
    let config = BattleConfig::default().with_attack_power(Faction::Elf, 15);
    let mut battle = Battle::new(&map, &config);
    let outcome = battle.run_simulation();

    assert_eq!(outcome.winner, Some(Faction::Elf));
    assert_eq!(outcome.rounds, 29);
    assert_eq!(outcome.remaining_health, 172);
    assert_eq!(outcome.casualties.of(Faction::Elf), 0);
}
