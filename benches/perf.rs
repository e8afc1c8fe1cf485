use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use mvp_pipeline::clean::{clean_mvp, clean_players, clean_standings};
use mvp_pipeline::extract::extract_table;
use mvp_pipeline::features::predictor_table;
use mvp_pipeline::frame::Frame;
use mvp_pipeline::merge::merge_basetable;
use mvp_pipeline::page_cache::Category;
use mvp_pipeline::scrape::season_frame;

fn scraped(page: &str, category: Category) -> Frame {
    season_frame(page, category, 2020).expect("valid fixture page")
}

fn bench_visible_table_extract(c: &mut Criterion) {
    c.bench_function("visible_table_extract", |b| {
        b.iter(|| {
            let table = extract_table(black_box(PER_GAME_PAGE), "per_game_stats", "bench").unwrap();
            black_box(table.rows.len());
        })
    });
}

fn bench_comment_hidden_extract(c: &mut Criterion) {
    c.bench_function("comment_hidden_extract", |b| {
        b.iter(|| {
            let table =
                extract_table(black_box(STANDINGS_PAGE), "divs_standings_W", "bench").unwrap();
            black_box(table.rows.len());
        })
    });
}

fn bench_standings_season_frame(c: &mut Criterion) {
    c.bench_function("standings_season_frame", |b| {
        b.iter(|| {
            let frame = season_frame(black_box(STANDINGS_PAGE), Category::Standings, 2020).unwrap();
            black_box(frame.row_count());
        })
    });
}

fn bench_clean_players(c: &mut Criterion) {
    let frame = scraped(PER_GAME_PAGE, Category::PerGame);
    c.bench_function("clean_players", |b| {
        b.iter(|| {
            let cleaned = clean_players(black_box(frame.clone())).unwrap();
            black_box(cleaned.row_count());
        })
    });
}

fn bench_merge_basetable(c: &mut Criterion) {
    let mvp = clean_mvp(&scraped(AWARDS_PAGE, Category::MvpVoting)).expect("valid fixture page");
    let players =
        clean_players(scraped(PER_GAME_PAGE, Category::PerGame)).expect("valid fixture page");
    let standings =
        clean_standings(scraped(STANDINGS_PAGE, Category::Standings)).expect("valid fixture page");

    c.bench_function("merge_basetable", |b| {
        b.iter(|| {
            let (basetable, report) = merge_basetable(
                black_box(mvp.clone()),
                black_box(players.clone()),
                black_box(standings.clone()),
            )
            .unwrap();
            black_box((basetable.row_count(), report.standings_only_rows));
        })
    });
}

fn bench_predictor_table(c: &mut Criterion) {
    let mvp = clean_mvp(&scraped(AWARDS_PAGE, Category::MvpVoting)).expect("valid fixture page");
    let players =
        clean_players(scraped(PER_GAME_PAGE, Category::PerGame)).expect("valid fixture page");
    let standings =
        clean_standings(scraped(STANDINGS_PAGE, Category::Standings)).expect("valid fixture page");
    let (basetable, _) = merge_basetable(mvp, players, standings).expect("valid fixture page");

    c.bench_function("predictor_table", |b| {
        b.iter(|| {
            let predictors = predictor_table(black_box(&basetable));
            black_box(predictors.columns.len());
        })
    });
}

criterion_group!(
    perf,
    bench_visible_table_extract,
    bench_comment_hidden_extract,
    bench_standings_season_frame,
    bench_clean_players,
    bench_merge_basetable,
    bench_predictor_table
);
criterion_main!(perf);

static AWARDS_PAGE: &str = include_str!("../tests/fixtures/awards_2020.html");
static PER_GAME_PAGE: &str = include_str!("../tests/fixtures/per_game_2020.html");
static STANDINGS_PAGE: &str = include_str!("../tests/fixtures/standings_2020.html");
