//! Text of everything the bot publishes.

use crate::color::ColorScheme;
use crate::forum::Comment;
use crate::types::Submission;

pub struct PostText {
    pub title: String,
    pub body: String,
}

fn with_footer(body: String, footer: &str) -> String {
    if footer.is_empty() {
        body
    } else {
        format!("{body}\n\n\n{footer}")
    }
}

pub fn theme_voting(
    next_month: &str,
    month: &str,
    month_length: u32,
    footer: &str,
) -> PostText {
    PostText {
        title: format!("{next_month} theme voting"),
        body: with_footer(
            format!(
                "Hello everyone, please comment your suggestion for next months theme.\n\n\
                 The deadline for voting will be the end of {month} {month_length}.\n\n\
                 Please limit your response to only your theme idea, I am not a smart bot."
            ),
            footer,
        ),
    }
}

pub fn voting_open_title(last_month: &str) -> String {
    format!("{last_month} voting now open! Click here to pick your favourite submission!")
}

pub fn theme_announcement(month: &str, suggestion: &Comment, footer: &str) -> PostText {
    let theme = suggestion.body.trim();
    PostText {
        title: format!("{month} monthly theme: {theme}"),
        body: with_footer(
            format!(
                "This months theme is {theme} as suggested by /u/{}\n\n\
                 Submissions will be due at the end of the month",
                suggestion.author
            ),
            footer,
        ),
    }
}

pub fn winner_announcement(last_month: &str, winner: &Submission, footer: &str) -> PostText {
    PostText {
        title: format!("{last_month} monthly winner: {}", winner.author),
        body: with_footer(
            format!(
                "Thanks to everyone who participated in last month's challenge.\n\n\
                 {last_month}'s winner is /u/{author}, with their submission: [{title}]({url})",
                author = winner.author,
                title = winner.title,
                url = winner.source_url,
            ),
            footer,
        ),
    }
}

/// Sidebar block placed between the winner markers.
pub fn sidebar_winner(last_month: &str, winner: &Submission) -> String {
    let short_title: String = winner.title.chars().take(30).collect();
    format!(
        "\n> *{last_month} monthly winner:*  \n[{short_title}]({url}) by /u/{author}\n\n",
        url = winner.source_url,
        author = winner.author,
    )
}

/// Accent-color rules placed between the stylesheet markers.
pub fn accent_css(colors: &ColorScheme) -> String {
    let ColorScheme {
        primary,
        hover,
        active,
    } = colors;
    [
        format!(
            ".side .titlebox .md h3 a, .drop-choices a.choice:hover, \
             .submit-page #newlink.submit.content ul.tabmenu.formtab, \
             .submit_text.enabled.roundfield, body .btn, body button, .content .infobar, \
             form input[type=checkbox]:checked + label:before, \
             .pretty-form input[type=checkbox]:checked + label:before, \
             .titlebox .fancy-toggle-button .active.add, \
             .reddit-infobar.with-icon.locked-infobar, \
             .reddit-infobar.with-icon.locked-infobar:before, \
             .flair, .side .md>blockquote:first-of-type a:hover:after \
             {{background-color: {primary};}}"
        ),
        format!(
            ".side .titlebox .md h3 a:hover, .btn:hover, body button:hover, \
             .titlebox .fancy-toggle-button .active.add:hover \
             {{background-color: {hover};}}"
        ),
        format!(
            ".side .titlebox .md h3 a:active, .btn:active, body button:active, \
             .titlebox .fancy-toggle-button .active.add:active \
             {{background-color: {active};}}"
        ),
        format!(
            ".thing .title.loggedin.click, .thing .title.click, .thing .title.loggedin, \
             .thing .title, .link .entry .buttons li a.comments, \
             .link .entry .buttons li a.flairselectbtn, .link .entry .buttons li a:hover, \
             .titlebox .tagline a.flairselectbtn, .md a, .side .titlebox .md h4 a, \
             .wiki-page .wiki-page-content .md.wiki h4, .sidebox.create .morelink a, a, \
             .side:after, .usertext .bottom-area a.reddiquette, \
             .wiki-page .pageactions .wikiaction-current, .tagline .submitter, \
             .combined-search-page .search-result .search-result-header .search-title, \
             .combined-search-page .search-result a, \
             .combined-search-page .search-result a>mark, \
             .combined-search-page .search-result .search-comments, .flairselector h2, \
             .linefield .title, body .content .sitetable .link .title a:hover, \
             .link .entry .tagline a:hover, .comment .author:hover, .morelink a, \
             .morelink:hover a, #header .tabmenu li.selected a, \
             form input[type=checkbox]:checked + label, \
             .pretty-form input[type=checkbox]:checked + label, \
             .side .md>blockquote:first-of-type a \
             {{color: {primary};}}"
        ),
        format!(
            "form input[type=checkbox]:checked + label:before, \
             .pretty-form input[type=checkbox]:checked + label:before \
             {{border-color: {primary};}}"
        ),
        format!(
            "body .content .roundfield textarea:focus, body .content input[type=text]:focus, \
             body .content input[type=url]:focus, .roundfield input[type=password]:focus, \
             .roundfield input[type=number]:focus \
             {{border-color: {primary}; box-shadow: 0 1px 0 0 {primary};}}"
        ),
    ]
    .concat()
}
