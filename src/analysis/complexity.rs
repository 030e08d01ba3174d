use tree_sitter::Node;

/// Cyclomatic complexity of a function body: 1 plus one per conditional,
/// loop, case clause and short-circuit operator. Nested functions and
/// classes count on their own and are skipped.
pub fn cyclomatic_complexity(body: Option<Node>) -> u32 {
    let mut complexity = 1;
    if let Some(body) = body {
        visit_node_for_complexity(body, &mut complexity);
    }
    complexity
}

fn visit_node_for_complexity(node: Node, complexity: &mut u32) {
    match node.kind() {
        "if_statement" | "ternary_expression" => *complexity += 1,
        "switch_case" => *complexity += 1,
        "while_statement" | "do_statement" | "for_statement" | "for_in_statement" => {
            *complexity += 1
        }
        "binary_expression" if is_short_circuit(node) => *complexity += 1,
        "augmented_assignment_expression" if is_short_circuit(node) => *complexity += 1,
        _ => {}
    }

    for child in node.children(&mut node.walk()) {
        if !is_nested_scope(child) {
            visit_node_for_complexity(child, complexity);
        }
    }
}

fn is_nested_scope(node: Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function"
            | "function_expression"
            | "function"
            | "function_declaration"
            | "generator_function"
            | "generator_function_declaration"
            | "method_definition"
            | "class"
            | "class_declaration"
    )
}

fn is_short_circuit(node: Node) -> bool {
    node.child_by_field_name("operator")
        .map(|op| matches!(op.kind(), "&&" | "||" | "??" | "&&=" | "||=" | "??="))
        .unwrap_or(false)
}
