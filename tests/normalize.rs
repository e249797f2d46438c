use mcq_sleuth::normalize::{
    contains_term, is_stopword, phrases, strip_label, term_words, text_contains_term, tokens,
    trigger_words, word_count, words,
};

#[test]
fn label_prefix_is_stripped() {
    assert_eq!(strip_label("  c)   Round robin "), "Round robin");
    assert_eq!(strip_label("A) FIFO"), "FIFO");
    assert_eq!(strip_label("e) Not a label"), "e) Not a label");
    assert_eq!(strip_label("Round robin (RR)"), "Round robin (RR)");
}

#[test]
fn tokens_drop_stopwords_and_short_words() {
    let t = tokens("The Operating System's kernel!", 3);
    assert_eq!(t.into_iter().collect::<Vec<_>>(), ["kernel"]);

    let t = tokens("I/O bus", 2);
    assert_eq!(t.into_iter().collect::<Vec<_>>(), ["bus"]);
}

#[test]
fn words_keep_everything_alphabetic() {
    let w = words("I/O is FAST");
    assert_eq!(w.into_iter().collect::<Vec<_>>(), ["fast", "i", "is", "o"]);
}

#[test]
fn punctuation_only_text_is_empty_not_an_error() {
    assert!(tokens("?!... ---", 3).is_empty());
    assert!(words("?!... ---").is_empty());
    assert!(phrases("?!... ---", 3).is_empty());
    assert!(term_words("").is_empty());
    assert_eq!(word_count("   "), 0);
}

#[test]
fn term_matching_is_whole_word() {
    assert!(text_contains_term("Circular-wait condition", "circular wait"));
    assert!(text_contains_term("Hold and WAIT", "wait"));
    assert!(!text_contains_term("Waiting for I/O", "wait"));
    assert!(!text_contains_term("wait", "circular wait"));
    assert!(!contains_term(&term_words("anything"), &[]));
}

#[test]
fn phrases_pair_adjacent_content_words() {
    let p = phrases("Circular wait condition holds", 3);
    assert!(p.contains("circular wait"));
    assert!(p.contains("wait condition"));
    assert!(p.contains("condition holds"));
    assert_eq!(p.len(), 3);

    assert!(phrases("the wait of it", 3).is_empty());
}

#[test]
fn domain_vocabulary_counts_as_stopwords() {
    assert!(is_stopword("process"));
    assert!(is_stopword("following"));
    assert!(!is_stopword("kernel"));
}

#[test]
fn trigger_words_split_like_term_matching() {
    let t = trigger_words("ext4 and FAT32 on I/O", 3);
    assert_eq!(t.into_iter().collect::<Vec<_>>(), ["ext4", "fat32"]);
    assert!(phrases("Mounts ext4 volumes", 3).contains("ext4 volumes"));
}
