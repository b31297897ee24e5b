use bevy::math::UVec2;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use world_index::{
    BlockFlags, ContentRegistry, StructureIndex, TeamId, TeamRegistry, WorldConfig, WorldGrid,
};

struct Harness {
    content: ContentRegistry,
    grid: WorldGrid,
    index: StructureIndex,
    teams: TeamRegistry,
}

fn populated_harness(width: u32, height: u32) -> Harness {
    let config = WorldConfig {
        grid_size: UVec2::new(width, height),
        ..WorldConfig::default()
    };
    let content = ContentRegistry::builtin();
    let mut grid = WorldGrid::new(config.grid_size);
    let mut index = StructureIndex::new(&config, &content);
    let teams = TeamRegistry::new(config.base_unit_cap);

    let battery = content.block_by_name("battery").unwrap().clone();
    let turret = content.block_by_name("gun-turret").unwrap().clone();
    let ore = content.block_by_name("ore-copper").unwrap().clone();

    // Scatter structures over two teams plus an ore seam.
    for y in 0..height {
        for x in 0..width {
            let pos = UVec2::new(x, y);
            if (x + y) % 7 == 0 {
                let team = TeamId(1 + ((x / 3) % 2) as u8);
                let block = if x % 2 == 0 { &battery } else { &turret };
                grid.set_block(pos, block, team);
            }
            if y % 11 == 0 {
                grid.set_overlay(pos, Some(ore.id));
            }
        }
    }
    index.rebuild(&grid, &content);

    Harness {
        content,
        grid,
        index,
        teams,
    }
}

fn mutation_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutation_churn");
    let churn_tiles: Vec<UVec2> = (0..512).map(|i| UVec2::new(i % 96, (i / 96) * 5)).collect();
    group.throughput(Throughput::Elements(churn_tiles.len() as u64 * 2));

    group.bench_function("remove_then_add_512_tiles", |b| {
        b.iter_batched_ref(
            || populated_harness(96, 64),
            |harness| {
                for &pos in &churn_tiles {
                    harness.index.remove_index(
                        &mut harness.grid,
                        &harness.content,
                        &mut harness.teams,
                        pos,
                    );
                    harness.index.add_index(&harness.grid, &harness.content, pos);
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn flag_queries(c: &mut Criterion) {
    let harness = populated_harness(96, 64);
    let mut group = c.benchmark_group("flag_queries");

    group.bench_function("get_enemy_battery", |b| {
        b.iter(|| harness.index.get_enemy(TeamId(1), BlockFlags::BATTERY));
    });
    group.bench_function("presence_lookups", |b| {
        let battery = harness.content.block_by_name("battery").unwrap().id;
        let copper = harness.content.item_by_name("copper").unwrap().id;
        b.iter(|| {
            (
                harness.index.is_block_present(battery),
                harness.index.has_ore(copper),
            )
        });
    });
    group.finish();
}

criterion_group!(benches, mutation_churn, flag_queries);
criterion_main!(benches);
