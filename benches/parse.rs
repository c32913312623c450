use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dotenv_codec::{EnvMap, Parser};

fn bench_parse(c: &mut Criterion) {
    let parser = Parser::new();
    let fallback = EnvMap::new();

    let mut group = c.benchmark_group("parse");
    for size in [1_024usize, 10_240, 102_400] {
        let input = make_input(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| {
                parser
                    .parse_str_with_env(black_box(input), &fallback)
                    .expect("parse should succeed")
            });
        });
    }
    group.finish();
}

fn make_input(bytes: usize) -> String {
    let block = "# settings\n\
                 BASE=/srv/app\n\
                 export BIN=${BASE}/bin # binaries\n\
                 GREETING=\"hello\\tworld\"\n\
                 RAW='single $BASE'\n\
                 PORT: 8080\n";
    let repeat = bytes / block.len() + 1;
    block.repeat(repeat)
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
