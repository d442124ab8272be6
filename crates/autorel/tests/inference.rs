use std::sync::Arc;

use autorel::prelude::*;
use autorel::KeyMapping;

fn blog_schema() -> Arc<MemoryDatabase> {
    let db = MemoryDatabase::new().with_table_prefix("jos_");
    db.create_table(
        "blog_posts",
        vec![
            ColumnDescriptor::primary("id"),
            ColumnDescriptor::new("title"),
            ColumnDescriptor::new("author_id"),
            ColumnDescriptor::new("status_id"),
        ],
    );
    db.create_table(
        "blog_authors",
        vec![ColumnDescriptor::primary("id"), ColumnDescriptor::new("name")],
    );
    db.create_table(
        "blog_posts_categories",
        vec![ColumnDescriptor::new("id"), ColumnDescriptor::new("category_id")],
    );
    db.create_table(
        "blog_categories",
        vec![ColumnDescriptor::primary("id"), ColumnDescriptor::new("title")],
    );
    db.create_table("shop_posts_orders", vec![ColumnDescriptor::primary("id")]);
    db.create_raw_table("wp_blog_posts_tags", vec![ColumnDescriptor::primary("id")]);
    Arc::new(db)
}

fn acl_schema() -> Arc<MemoryDatabase> {
    let db = MemoryDatabase::new();
    db.create_table(
        "acl_users",
        vec![ColumnDescriptor::primary("id"), ColumnDescriptor::new("name")],
    );
    db.create_table(
        "acl_user_groups",
        vec![ColumnDescriptor::new("id"), ColumnDescriptor::new("group_name")],
    );
    Arc::new(db)
}

fn engine(db: &Arc<MemoryDatabase>) -> AssociationEngine {
    AssociationEngine::new(db.clone(), db.clone(), Arc::new(AssociationCache::new()))
}

fn posts() -> TableIdentity {
    TableIdentity::new("blog", "posts")
}

#[test]
fn id_suffix_column_infers_one_to_one() {
    let db = blog_schema();
    let graph = engine(&db).infer(&posts()).unwrap();

    let author = graph.association("author").expect("author association");
    assert_eq!(author.kind(), RelationshipKind::OneToOne);
    assert_eq!(author.model(), &TableIdentity::new("blog", "authors"));
    assert_eq!(author.keys(), &KeyMapping::new().with("id", "author_id"));
    assert_eq!(author.through(), None);
}

#[test]
fn id_suffix_without_sibling_table_infers_nothing() {
    let db = blog_schema();
    let graph = engine(&db).infer(&posts()).unwrap();
    assert!(!graph.contains("status"));
    assert!(!graph.contains("statuses"));
}

#[test]
fn singular_prefix_infers_one_to_many() {
    let db = acl_schema();
    let graph = engine(&db).infer(&TableIdentity::new("acl", "users")).unwrap();

    let groups = graph.association("groups").expect("groups association");
    assert_eq!(groups.kind(), RelationshipKind::OneToMany);
    assert_eq!(groups.model(), &TableIdentity::new("acl", "user_groups"));
    assert_eq!(groups.keys(), &KeyMapping::identity(["id"]));
}

#[test]
fn plural_prefix_infers_many_to_many_through_join_table() {
    let db = blog_schema();
    let graph = engine(&db).infer(&posts()).unwrap();

    let categories = graph.association("categories").expect("categories association");
    assert_eq!(categories.kind(), RelationshipKind::ManyToMany);
    assert_eq!(categories.model(), &TableIdentity::new("blog", "categories"));
    assert_eq!(
        categories.through(),
        Some(&TableIdentity::new("blog", "posts_categories"))
    );
    assert_eq!(categories.keys(), &KeyMapping::identity(["id"]));
}

#[test]
fn only_same_package_tables_under_the_raw_prefix_are_considered() {
    let db = blog_schema();
    let graph = engine(&db).infer(&posts()).unwrap();

    // blog_authors and blog_categories also pass the primary-key probe and
    // become one-to-many by their single-segment names; "categories" was
    // already claimed by the join table.
    let names: Vec<&str> = graph.names().collect();
    assert_eq!(names, vec!["author", "authors", "categories"]);
}

#[test]
fn inference_is_deterministic() {
    let db = blog_schema();
    let first = engine(&db).infer(&posts()).unwrap();
    let second = engine(&db).infer(&posts()).unwrap();

    assert_eq!(*first, *second);
    assert_eq!(
        serde_json::to_string(&*first).unwrap(),
        serde_json::to_string(&*second).unwrap()
    );
}

#[test]
fn repeated_inference_does_not_touch_the_catalog() {
    let db = blog_schema();
    let engine = engine(&db);

    let first = engine.infer(&posts()).unwrap();
    let calls = (db.list_tables_calls(), db.columns_of_calls(), db.resolve_calls());
    let second = engine.infer(&posts()).unwrap();

    assert_eq!(
        (db.list_tables_calls(), db.columns_of_calls(), db.resolve_calls()),
        calls
    );
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn engines_sharing_a_cache_share_results() {
    let db = blog_schema();
    let cache = Arc::new(AssociationCache::new());
    let a = AssociationEngine::new(db.clone(), db.clone(), cache.clone());
    let b = AssociationEngine::new(db.clone(), db.clone(), cache);

    a.infer(&posts()).unwrap();
    b.infer(&posts()).unwrap();
    b.infer(&TableIdentity::new("blog", "authors")).unwrap();

    assert_eq!(db.list_tables_calls(), 1);
}

#[test]
fn first_registration_of_a_name_wins() {
    let db = blog_schema();
    db.create_table(
        "blog_post_author",
        vec![ColumnDescriptor::primary("id"), ColumnDescriptor::new("note")],
    );
    let graph = engine(&db).infer(&posts()).unwrap();

    let author = graph.association("author").unwrap();
    assert_eq!(author.kind(), RelationshipKind::OneToOne);
    assert_eq!(author.model(), &TableIdentity::new("blog", "authors"));
}

#[test]
fn unusable_target_models_are_skipped() {
    let db = blog_schema();
    db.set_available("blog_authors", false).unwrap();
    assert!(!engine(&db).infer(&posts()).unwrap().contains("author"));

    let db = blog_schema();
    db.mark_not_a_model("blog_authors", "abstract table").unwrap();
    assert!(!engine(&db).infer(&posts()).unwrap().contains("author"));
}

#[test]
fn unknown_source_table_yields_empty_associations() {
    let db = blog_schema();
    let engine = engine(&db);
    let missing = TableIdentity::new("blog", "drafts");

    assert!(engine.infer(&missing).is_err());
    assert!(engine.associations(&missing).is_empty());
    assert!(!engine.cache().contains(&missing));
}

#[test]
fn external_cache_survives_a_fresh_process() {
    let db = blog_schema();
    let external = Arc::new(MemoryCache::new());

    let written = engine(&db)
        .with_external_cache(external.clone())
        .infer(&posts())
        .unwrap();
    assert_eq!(
        external.keys(),
        vec!["autorel-identifier-blog.posts.associations".to_string()]
    );

    let calls = db.list_tables_calls();
    let read = engine(&db)
        .with_external_cache(external.clone())
        .infer(&posts())
        .unwrap();
    assert_eq!(*read, *written);
    assert_eq!(db.list_tables_calls(), calls);

    external.evict("autorel-identifier-blog.posts.associations");
    engine(&db)
        .with_external_cache(external.clone())
        .infer(&posts())
        .unwrap();
    assert_eq!(db.list_tables_calls(), calls + 1);
}

#[test]
fn external_cache_key_follows_config() {
    let db = blog_schema();
    let external = Arc::new(MemoryCache::new());
    let config = AssociationConfig::new()
        .external_cache_prefix("site-")
        .external_cache_suffix(".rels");

    engine(&db)
        .with_external_cache(external.clone())
        .with_config(config)
        .infer(&posts())
        .unwrap();

    assert_eq!(external.keys(), vec!["site-blog.posts.rels".to_string()]);
}
