use criterion::{criterion_group, criterion_main, Criterion};
use std::io::{Read, Write};
use stegano_engine::media::cover::generate_noise_cover;
use stegano_engine::{BlockTables, Cover, EmbeddingStream, ExtractionStream, StegoConfig, Strategy};

const STRATEGIES: [Strategy; 3] = [
    Strategy::Sequential,
    Strategy::KeyedRandomPixel,
    Strategy::KeyedRandomCoefficient,
];

pub fn embedding(c: &mut Criterion) {
    let tables = BlockTables::standard();
    let plain_image = generate_noise_cover(256, 256, 32..=224);
    let secret_message = b"Hello World!";

    for strategy in STRATEGIES {
        let config = StegoConfig::default()
            .with_strategy(strategy)
            .with_password("bench");

        c.bench_function(&format!("Embedding {strategy:?}"), |b| {
            b.iter(|| {
                let mut stream = EmbeddingStream::open_for_write(
                    Some(Cover::from_image(plain_image.clone())),
                    secret_message.len(),
                    "hello.txt",
                    &config,
                    &tables,
                )
                .expect("Cannot open the cover");
                stream
                    .write_all(&secret_message[..])
                    .expect("Cannot write secret message");
                stream.finish().expect("Cannot finish embedding")
            })
        });
    }
}

pub fn extraction(c: &mut Criterion) {
    let tables = BlockTables::standard();
    let secret_message = b"Hello World!";

    for strategy in STRATEGIES {
        let config = StegoConfig::default()
            .with_strategy(strategy)
            .with_password("bench");
        let mut stream = EmbeddingStream::open_for_write(
            Some(Cover::from_image(generate_noise_cover(256, 256, 32..=224))),
            secret_message.len(),
            "hello.txt",
            &config,
            &tables,
        )
        .expect("Cannot open the cover");
        stream
            .write_all(&secret_message[..])
            .expect("Cannot write secret message");
        let stego = Cover::from_image(stream.finish().expect("Cannot finish embedding"));
        let mut buf = [0; 12];

        c.bench_function(&format!("Extraction {strategy:?}"), |b| {
            b.iter(|| {
                ExtractionStream::open_for_read(Some(&stego), &config, &tables)
                    .expect("Cannot read the header")
                    .read_exact(&mut buf)
                    .expect("Failed to read 12 bytes");
            })
        });
    }
}

criterion_group!(benches, embedding, extraction);
criterion_main!(benches);
