use super::*;

#[test]
fn test_span_new_and_len() {
    let span = Span::new(3, 10);
    assert_eq!(span.start, 3);
    assert_eq!(span.end, 10);
    assert_eq!(span.len(), 7);
    assert!(!span.is_empty());
}

#[test]
fn test_span_at_is_empty() {
    let span = Span::at(5);
    assert!(span.is_empty());
    assert_eq!(span.len(), 0);
}

#[test]
fn test_span_contains_half_open() {
    let span = Span::new(2, 5);
    assert!(!span.contains(1));
    assert!(span.contains(2));
    assert!(span.contains(4));
    assert!(!span.contains(5));
}

#[test]
fn test_span_contains_span() {
    let outer = Span::new(0, 10);
    assert!(outer.contains_span(Span::new(2, 8)));
    assert!(outer.contains_span(outer));
    assert!(!outer.contains_span(Span::new(5, 11)));
}

#[test]
fn test_span_merge() {
    let a = Span::new(2, 5);
    let b = Span::new(4, 9);
    assert_eq!(a.merge(b), Span::new(2, 9));
    assert_eq!(b.merge(a), Span::new(2, 9));
}

#[test]
fn test_span_slice() {
    let text = "const x = 42;";
    assert_eq!(Span::new(6, 7).slice(text), "x");
    // Out-of-range spans clamp instead of panicking
    assert_eq!(Span::new(100, 200).slice(text), "");
}

#[test]
fn test_dummy_span() {
    assert!(Span::dummy().is_dummy());
    assert!(!Span::new(0, 0).is_dummy());
}
