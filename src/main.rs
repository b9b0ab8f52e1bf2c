fn main() -> anyhow::Result<()> {
    campus_walk::run(campus_walk::CampusConfig::default())
}
