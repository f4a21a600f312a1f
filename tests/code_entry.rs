use accountdesk::registration::{ArrowDirection, CodeEntry};

#[test]
fn test_typing_all_digits_completes() {
    let mut entry = CodeEntry::new(6);
    let mut last = None;
    for (index, digit) in ["1", "2", "3", "4", "5", "6"].iter().enumerate() {
        last = Some(entry.on_character_entered(index, digit));
    }
    let emission = last.unwrap();
    assert_eq!(emission.value, "123456");
    assert!(emission.complete);
    // Focus stays on the last slot
    assert_eq!(entry.focus_target().index(), 5);
}

#[test]
fn test_non_numeric_input_leaves_slot_unchanged() {
    let mut entry = CodeEntry::new(6);
    entry.on_character_entered(0, "4");
    let emission = entry.on_character_entered(0, "a");
    assert_eq!(emission.value, "4");
    assert!(!emission.complete);
    assert_eq!(entry.slots()[0], Some('4'));
}

#[test]
fn test_backspace_on_empty_slot_clears_previous() {
    let mut entry = CodeEntry::new(6);
    entry.on_character_entered(0, "1");
    entry.on_character_entered(1, "2");

    // Slot 2 is empty: backspace clears slot 1 and moves there
    let emission = entry.on_backspace(2);
    assert_eq!(emission.value, "1");
    assert_eq!(entry.focus_target().index(), 1);

    // Slot 0 holds a digit: backspace clears it in place
    let emission = entry.on_backspace(0);
    assert_eq!(emission.value, "");
    assert_eq!(entry.focus_target().index(), 1);
}

#[test]
fn test_backspace_on_first_empty_slot_is_harmless() {
    let mut entry = CodeEntry::new(4);
    let emission = entry.on_backspace(0);
    assert_eq!(emission.value, "");
    assert_eq!(entry.focus_target().index(), 0);
}

#[test]
fn test_paste_keeps_digits_only() {
    let mut entry = CodeEntry::new(6);
    let emission = entry.on_paste("Your code: 12-34 56");
    assert_eq!(emission.value, "123456");
    assert!(emission.complete);
    assert_eq!(entry.focus_target().index(), 5);
}

#[test]
fn test_short_paste_focuses_first_empty_slot() {
    let mut entry = CodeEntry::new(6);
    let emission = entry.on_paste("987");
    assert_eq!(emission.value, "987");
    assert!(!emission.complete);
    assert_eq!(entry.focus_target().index(), 3);
}

#[test]
fn test_long_paste_is_truncated() {
    let mut entry = CodeEntry::new(4);
    let emission = entry.on_paste("123456789");
    assert_eq!(emission.value, "1234");
    assert!(emission.complete);
}

#[test]
fn test_paste_replaces_previous_content() {
    let mut entry = CodeEntry::new(4);
    entry.on_paste("1234");
    let emission = entry.on_paste("56");
    assert_eq!(emission.value, "56");
    assert_eq!(entry.slots(), &[Some('5'), Some('6'), None, None]);
}

#[test]
fn test_clear_resets_slots_and_focus() {
    let mut entry = CodeEntry::new(6);
    entry.on_paste("123456");
    let emission = entry.clear();
    assert_eq!(emission.value, "");
    assert!(entry.is_empty());
    assert_eq!(entry.focus_target().index(), 0);
}

#[test]
fn test_arrow_navigation() {
    let mut entry = CodeEntry::new(6);
    entry.on_arrow_key(ArrowDirection::Right, 0);
    assert_eq!(entry.focus_target().index(), 1);
    entry.on_arrow_key(ArrowDirection::Left, 1);
    assert_eq!(entry.focus_target().index(), 0);
    entry.on_arrow_key(ArrowDirection::Left, 0);
    assert_eq!(entry.focus_target().index(), 0);
}

#[test]
fn test_value_skips_gaps() {
    let mut entry = CodeEntry::new(6);
    entry.on_character_entered(0, "1");
    entry.on_character_entered(3, "4");
    assert_eq!(entry.value(), "14");
    assert!(!entry.is_complete());
}

#[test]
fn test_clear_twice_is_harmless() {
    let mut entry = CodeEntry::new(6);
    entry.on_paste("4821");

    for _ in 0..2 {
        let emission = entry.clear();
        assert_eq!(emission.value, "");
        assert!(!emission.complete);
        assert!(entry.is_empty());
        assert!(entry.slots().iter().all(Option::is_none));
        assert_eq!(entry.value(), "");
    }
}

#[test]
fn test_completion_is_reported_once() {
    let mut entry = CodeEntry::new(6);
    let mut emissions = vec![entry.on_paste("123456")];

    // Editing after the paste: clear the last digit, move around, then try a
    // letter in the empty slot.
    emissions.push(entry.on_backspace(5));
    entry.on_arrow_key(ArrowDirection::Left, 5);
    entry.on_arrow_key(ArrowDirection::Right, 4);
    emissions.push(entry.on_character_entered(5, "x"));
    emissions.push(entry.on_backspace(5));

    assert_eq!(emissions.len(), 4);
    assert_eq!(emissions.iter().filter(|e| e.complete).count(), 1);
    assert!(emissions[0].complete);
    assert_eq!(emissions[0].value, "123456");
    assert_eq!(emissions[3].value, "1234");
}
