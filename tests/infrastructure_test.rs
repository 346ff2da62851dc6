//! Test to verify test infrastructure works correctly

mod common;

use common::builders::ComponentTypeBuilder;
use flowstudio_rs::flow::ComponentCategory;

#[test]
fn test_infrastructure_setup() {
    // Test that builders work
    let component = ComponentTypeBuilder::new("file_writer")
        .name("File Writer")
        .category(ComponentCategory::Output)
        .build();

    assert_eq!(component.type_name, "file_writer");
    assert_eq!(component.name, "File Writer");
    assert_eq!(component.category, ComponentCategory::Output);
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}
