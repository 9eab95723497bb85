fn main() -> anyhow::Result<()> {
    prize_wheel_lib::run()
}
