use vitrine::Config;

fn main() -> anyhow::Result<()> {
    // Runtime size comes from config, which has to load before tokio spins up.
    let worker_threads = Config::load()?.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    builder.build()?.block_on(vitrine::run())
}
