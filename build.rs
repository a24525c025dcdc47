fn main() {
    // Migrations are embedded by `sqlx::test`, rebuild when they change
    println!("cargo:rerun-if-changed=migrations");
}
